use serde::{Deserialize, Serialize};
use structurify_core::error::StructurifyError;
use structurify_core::models::{CreateProjectParams, DeleteResponse, Project, ProjectDetails};

use crate::client::StructurifyClient;

#[derive(Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct ProjectEnvelope {
    project: Project,
}

#[derive(Serialize)]
struct UpdateProjectRequest<'a> {
    name: &'a str,
}

/// Extraction projects.
pub struct Projects<'a> {
    client: &'a StructurifyClient,
}

impl<'a> Projects<'a> {
    pub(crate) fn new(client: &'a StructurifyClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Project>, StructurifyError> {
        let response: ProjectList = self.client.get(&["projects"], &[]).await?;
        Ok(response.projects)
    }

    /// Get a project with its columns and documents.
    pub async fn get(&self, project_id: &str) -> Result<ProjectDetails, StructurifyError> {
        self.client
            .get(&["projects", project_id], &[])
            .await
    }

    /// Create a new project from a template.
    pub async fn create(&self, params: &CreateProjectParams) -> Result<Project, StructurifyError> {
        let response: ProjectEnvelope = self.client.post(&["projects"], params).await?;
        tracing::info!(project_id = %response.project.id, "Project created");
        Ok(response.project)
    }

    /// Rename a project.
    pub async fn update(&self, project_id: &str, name: &str) -> Result<Project, StructurifyError> {
        let response: ProjectEnvelope = self
            .client
            .put(&["projects", project_id], &UpdateProjectRequest { name })
            .await?;
        Ok(response.project)
    }

    /// Delete a project and all its documents.
    pub async fn delete(&self, project_id: &str) -> Result<DeleteResponse, StructurifyError> {
        self.client
            .delete(&["projects", project_id])
            .await
    }
}
