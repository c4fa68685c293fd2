use serde::Deserialize;
use structurify_core::error::StructurifyError;
use structurify_core::models::{
    CreateExportParams, CreatedExport, DeleteResponse, Export, ExportDownload,
};

use crate::client::StructurifyClient;

#[derive(Deserialize)]
struct ExportEnvelope {
    export: Export,
}

#[derive(Deserialize)]
struct ExportList {
    #[serde(default)]
    exports: Vec<Export>,
}

/// Exports of extracted data.
pub struct Exports<'a> {
    client: &'a StructurifyClient,
}

impl<'a> Exports<'a> {
    pub(crate) fn new(client: &'a StructurifyClient) -> Self {
        Self { client }
    }

    /// Create an export. Small exports carry their content inline in `data`.
    pub async fn create(&self, params: &CreateExportParams) -> Result<CreatedExport, StructurifyError> {
        self.client.post(&["exports"], params).await
    }

    pub async fn get(&self, export_id: &str) -> Result<Export, StructurifyError> {
        let response: ExportEnvelope = self
            .client
            .get(&["exports", export_id], &[])
            .await?;
        Ok(response.export)
    }

    pub async fn list(&self, project_id: &str) -> Result<Vec<Export>, StructurifyError> {
        let response: ExportList = self
            .client
            .get(&["exports"], &[("projectId", project_id)])
            .await?;
        Ok(response.exports)
    }

    /// Download export data: inline content, or the raw body when the
    /// server answers with something else.
    pub async fn download(&self, export_id: &str) -> Result<ExportDownload, StructurifyError> {
        let body: serde_json::Value = self
            .client
            .get(&["exports", export_id, "download"], &[])
            .await?;
        Ok(ExportDownload::from_body(body))
    }

    /// Return the export content, creating the export and downloading it if
    /// it was not returned inline.
    pub async fn create_and_fetch(
        &self,
        params: &CreateExportParams,
    ) -> Result<ExportDownload, StructurifyError> {
        let created = self.create(params).await?;
        match created.data {
            Some(data) => Ok(ExportDownload::Inline(data)),
            None => self.download(&created.export.id).await,
        }
    }

    pub async fn delete(&self, export_id: &str) -> Result<DeleteResponse, StructurifyError> {
        self.client.delete(&["exports", export_id]).await
    }
}
