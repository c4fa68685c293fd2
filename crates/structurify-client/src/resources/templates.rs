use serde::Deserialize;
use structurify_core::error::StructurifyError;
use structurify_core::models::{ColumnTemplate, ProjectTemplate};

use crate::client::StructurifyClient;

#[derive(Deserialize)]
struct TemplateList<T> {
    #[serde(default = "Vec::new")]
    templates: Vec<T>,
}

#[derive(Deserialize)]
struct TemplateEnvelope {
    template: ProjectTemplate,
}

/// Project and column templates.
pub struct Templates<'a> {
    client: &'a StructurifyClient,
}

impl<'a> Templates<'a> {
    pub(crate) fn new(client: &'a StructurifyClient) -> Self {
        Self { client }
    }

    /// List all available project templates.
    pub async fn list(&self) -> Result<Vec<ProjectTemplate>, StructurifyError> {
        let response: TemplateList<ProjectTemplate> =
            self.client.get(&["project-templates"], &[]).await?;
        Ok(response.templates)
    }

    /// List all reusable column templates.
    pub async fn list_columns(&self) -> Result<Vec<ColumnTemplate>, StructurifyError> {
        let response: TemplateList<ColumnTemplate> = self.client.get(&["templates"], &[]).await?;
        Ok(response.templates)
    }

    pub async fn get(&self, template_id: &str) -> Result<ProjectTemplate, StructurifyError> {
        let response: TemplateEnvelope = self
            .client
            .get(&["project-templates", template_id], &[])
            .await?;
        Ok(response.template)
    }
}
