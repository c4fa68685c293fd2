use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StructurifyError;

/// Output type of a template column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    Text,
    Number,
    Date,
    Boolean,
    List,
    Table,
    Object,
    #[serde(other)]
    Unknown,
}

/// A reusable column definition (`GET /templates`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTemplate {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub prompt: String,
    pub format: ColumnFormat,
    #[serde(default)]
    pub category: Option<String>,
}

/// A project template: a named set of columns for a document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<ColumnTemplate>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub document_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A column of an instantiated project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub prompt: String,
    pub format: ColumnFormat,
    #[serde(default)]
    pub position: u32,
}

/// `GET /projects/{id}`: the project with its columns and documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub project: Project,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectParams {
    pub name: String,
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateProjectParams {
    pub fn new(name: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template_id: template_id.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Done,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    pub status: DocumentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `GET /documents/{id}/content`: base64 file content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub content: String,
    #[serde(default)]
    pub mime_type: String,
}

impl DocumentContent {
    /// Decode the base64 payload into raw file bytes.
    pub fn decode(&self) -> Result<Vec<u8>, StructurifyError> {
        BASE64
            .decode(self.content.as_bytes())
            .map_err(|e| StructurifyError::Decode(format!("Invalid base64 document content: {e}")))
    }
}

/// Body of `POST /documents`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentRequest {
    pub project_id: String,
    pub file_name: String,
    /// Base64-encoded file content.
    pub content: String,
    pub mime_type: String,
}

impl UploadDocumentRequest {
    pub fn new(
        project_id: impl Into<String>,
        file_name: impl Into<String>,
        bytes: &[u8],
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            file_name: file_name.into(),
            content: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown export format: {s} (expected csv or json)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Pending,
    Ready,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    pub format: ExportFormat,
    pub status: ExportStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExportParams {
    pub project_id: String,
    pub format: ExportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<Vec<String>>,
}

impl CreateExportParams {
    pub fn new(project_id: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            project_id: project_id.into(),
            format,
            document_ids: None,
        }
    }

    /// Restrict the export to the given documents.
    pub fn with_document_ids(mut self, ids: Vec<String>) -> Self {
        self.document_ids = Some(ids);
        self
    }
}

/// `POST /exports`: small exports come back inline in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedExport {
    pub export: Export,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Result of `GET /exports/{id}/download`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDownload {
    /// The exported file content.
    Inline(String),
    /// Any other response body, left for the caller to interpret.
    Object(serde_json::Value),
}

impl ExportDownload {
    pub fn from_body(body: serde_json::Value) -> Self {
        match body.get("data").and_then(|d| d.as_str()) {
            Some(data) => ExportDownload::Inline(data.to_string()),
            None => ExportDownload::Object(body),
        }
    }

    pub fn as_inline(&self) -> Option<&str> {
        match self {
            ExportDownload::Inline(data) => Some(data),
            ExportDownload::Object(_) => None,
        }
    }
}

/// Body of the various `DELETE` endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}
