use serde::{Deserialize, Serialize};
use structurify_core::error::StructurifyError;
use structurify_core::job::{ExtractionJob, WaitOptions};
use structurify_core::models::DeleteResponse;
use structurify_core::poller;

use crate::client::StructurifyClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunJobRequest<'a> {
    project_id: &'a str,
}

#[derive(Deserialize)]
struct JobEnvelope {
    job: ExtractionJob,
}

#[derive(Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<ExtractionJob>,
}

/// Extraction jobs.
pub struct Extraction<'a> {
    client: &'a StructurifyClient,
}

impl<'a> Extraction<'a> {
    pub(crate) fn new(client: &'a StructurifyClient) -> Self {
        Self { client }
    }

    /// Start an extraction job for a project.
    ///
    /// Consumes 1 credit per document extracted.
    pub async fn run(&self, project_id: &str) -> Result<ExtractionJob, StructurifyError> {
        let response: JobEnvelope = self
            .client
            .post(&["extraction-jobs"], &RunJobRequest { project_id })
            .await?;
        tracing::info!(job_id = %response.job.id, %project_id, "Extraction job started");
        Ok(response.job)
    }

    pub async fn get(&self, job_id: &str) -> Result<ExtractionJob, StructurifyError> {
        let response: JobEnvelope = self
            .client
            .get(&["extraction-jobs", job_id], &[])
            .await?;
        Ok(response.job)
    }

    pub async fn list(&self, project_id: &str) -> Result<Vec<ExtractionJob>, StructurifyError> {
        let response: JobList = self
            .client
            .get(&["extraction-jobs"], &[("projectId", project_id)])
            .await?;
        Ok(response.jobs)
    }

    pub async fn cancel(&self, job_id: &str) -> Result<DeleteResponse, StructurifyError> {
        self.client
            .delete(&["extraction-jobs", job_id])
            .await
    }

    /// Poll the job until it is `done`, `error` or `cancelled`.
    ///
    /// See [`poller::wait_for_completion`] for timeout semantics.
    pub async fn wait_for_completion(
        &self,
        job_id: &str,
        options: WaitOptions,
    ) -> Result<ExtractionJob, StructurifyError> {
        poller::wait_for_completion(self.client, job_id, options).await
    }
}
