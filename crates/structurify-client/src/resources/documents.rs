use std::path::Path;

use reqwest::Method;
use serde::Deserialize;
use structurify_core::error::StructurifyError;
use structurify_core::models::{DeleteResponse, Document, DocumentContent, UploadDocumentRequest};
use structurify_core::util::{document_name_from_path, mime_type_for};

use crate::client::{MultipartBody, RequestOptions, StructurifyClient};

#[derive(Deserialize)]
struct DocumentEnvelope {
    document: Document,
}

/// Documents uploaded to projects for extraction.
pub struct Documents<'a> {
    client: &'a StructurifyClient,
}

impl<'a> Documents<'a> {
    pub(crate) fn new(client: &'a StructurifyClient) -> Self {
        Self { client }
    }

    /// Upload raw file bytes. The MIME type is guessed from `name` when not given.
    pub async fn upload(
        &self,
        project_id: &str,
        name: &str,
        bytes: &[u8],
        mime_type: Option<&str>,
    ) -> Result<Document, StructurifyError> {
        let mime_type = mime_type.unwrap_or_else(|| mime_type_for(name));
        let request = UploadDocumentRequest::new(project_id, name, bytes, mime_type);

        tracing::debug!(%project_id, %name, %mime_type, size = bytes.len(), "Uploading document");

        let response: DocumentEnvelope = self.client.post(&["documents"], &request).await?;
        Ok(response.document)
    }

    /// Upload a file from disk, named after the file unless `name` is given.
    pub async fn upload_from_path(
        &self,
        project_id: &str,
        path: impl AsRef<Path>,
        name: Option<&str>,
    ) -> Result<Document, StructurifyError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = match name {
            Some(name) => name.to_string(),
            None => document_name_from_path(path),
        };
        self.upload(project_id, &name, &bytes, None).await
    }

    /// Upload a file from disk as `multipart/form-data`.
    ///
    /// Avoids the base64 overhead of [`upload`](Self::upload) for large
    /// files. `name` overrides the document name and is also sent as a form
    /// field.
    pub async fn upload_multipart(
        &self,
        project_id: &str,
        path: impl AsRef<Path>,
        name: Option<&str>,
    ) -> Result<Document, StructurifyError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = match name {
            Some(name) => name.to_string(),
            None => document_name_from_path(path),
        };
        let mime_type = mime_type_for(&file_name);

        let mut form = MultipartBody::new().text("projectId", project_id);
        if let Some(name) = name {
            form = form.text("name", name);
        }
        let form = form.file("file", file_name.as_str(), bytes, mime_type);

        tracing::debug!(%project_id, name = %file_name, %mime_type, "Uploading document as multipart");

        let body = self
            .client
            .request_segments(
                Method::POST,
                &["documents"],
                RequestOptions::new().multipart(form),
            )
            .await?;
        let response: DocumentEnvelope = serde_json::from_value(body)?;
        Ok(response.document)
    }

    pub async fn get(&self, document_id: &str) -> Result<Document, StructurifyError> {
        let response: DocumentEnvelope = self
            .client
            .get(&["documents", document_id], &[])
            .await?;
        Ok(response.document)
    }

    /// Get document content as base64 with its MIME type.
    pub async fn get_content(&self, document_id: &str) -> Result<DocumentContent, StructurifyError> {
        self.client
            .get(&["documents", document_id, "content"], &[])
            .await
    }

    /// Download the original file bytes.
    pub async fn download(&self, document_id: &str) -> Result<Vec<u8>, StructurifyError> {
        self.get_content(document_id).await?.decode()
    }

    pub async fn delete(&self, document_id: &str) -> Result<DeleteResponse, StructurifyError> {
        self.client
            .delete(&["documents", document_id])
            .await
    }
}
