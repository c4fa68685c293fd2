use std::time::Duration;

use thiserror::Error;

use crate::job::JobStatus;

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";
const DEFAULT_ERROR_CODE: &str = "Unknown";

/// Error types for the Structurify SDK.
///
/// HTTP failures are classified exactly once, in [`StructurifyError::from_response`],
/// and keep their kind for the rest of their life.
#[derive(Error, Debug)]
pub enum StructurifyError {
    /// HTTP 401: the API key was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP 402: the account has no credits left.
    #[error("Insufficient credits: {message}")]
    InsufficientCredits { message: String },

    /// HTTP 404.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// HTTP 429, with the server's `Retry-After` hint when it sent one.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<Duration>,
    },

    /// HTTP 400.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// HTTP 5xx.
    #[error("Server error (HTTP {status}): {message}")]
    Server { message: String, status: u16 },

    /// Any other non-2xx response.
    #[error("API error {code} (HTTP {status}): {message}")]
    Generic {
        message: String,
        code: String,
        status: u16,
        body: serde_json::Value,
    },

    /// Transport failure that is neither a timeout nor a connect error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Connection could not be established.
    #[error("Network error: {0}")]
    Network(String),

    /// A single request attempt exceeded the configured timeout.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The job poller gave up before the job reached a terminal state.
    #[error(
        "Job {job_id} did not complete within {}ms. Current status: {status}, progress: {progress}%",
        .timeout.as_millis()
    )]
    JobTimeout {
        job_id: String,
        timeout: Duration,
        status: JobStatus,
        progress: f64,
    },

    /// A caller-supplied argument was rejected before any request was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Environment configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Content returned by the server could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the SDK.
pub type Result<T> = std::result::Result<T, StructurifyError>;

impl StructurifyError {
    /// Classify a non-2xx response.
    ///
    /// `body` is the decoded error payload (`{"error": ..., "message": ...}`);
    /// `retry_after` is only consulted for HTTP 429.
    pub fn from_response(
        status: u16,
        body: serde_json::Value,
        retry_after: Option<Duration>,
    ) -> Self {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
            .to_string();

        match status {
            401 => StructurifyError::Authentication { message },
            402 => StructurifyError::InsufficientCredits { message },
            404 => StructurifyError::NotFound { message },
            429 => StructurifyError::RateLimit {
                message,
                retry_after,
            },
            400 => StructurifyError::Validation { message },
            s if s >= 500 => StructurifyError::Server { message, status },
            _ => {
                let code = body
                    .get("error")
                    .and_then(|c| c.as_str())
                    .unwrap_or(DEFAULT_ERROR_CODE)
                    .to_string();
                StructurifyError::Generic {
                    message,
                    code,
                    status,
                    body,
                }
            }
        }
    }

    /// HTTP status associated with this error, if it came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StructurifyError::Authentication { .. } => Some(401),
            StructurifyError::InsufficientCredits { .. } => Some(402),
            StructurifyError::NotFound { .. } => Some(404),
            StructurifyError::RateLimit { .. } => Some(429),
            StructurifyError::Validation { .. } => Some(400),
            StructurifyError::Server { status, .. } | StructurifyError::Generic { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        match self {
            StructurifyError::Authentication { .. } => "AUTH_ERROR",
            StructurifyError::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            StructurifyError::NotFound { .. } => "NOT_FOUND",
            StructurifyError::RateLimit { .. } => "RATE_LIMIT",
            StructurifyError::Validation { .. } => "VALIDATION_ERROR",
            StructurifyError::Server { .. } => "SERVER_ERROR",
            StructurifyError::Generic { code, .. } => code,
            StructurifyError::Http(_) => "HTTP_ERROR",
            StructurifyError::Network(_) => "NETWORK_ERROR",
            StructurifyError::Timeout(_) => "TIMEOUT",
            StructurifyError::JobTimeout { .. } => "JOB_TIMEOUT",
            StructurifyError::InvalidArgument(_) => "INVALID_ARGUMENT",
            StructurifyError::Config(_) => "CONFIG_ERROR",
            StructurifyError::Serialization(_) => "SERIALIZATION_ERROR",
            StructurifyError::Decode(_) => "DECODE_ERROR",
            StructurifyError::Io(_) => "IO_ERROR",
        }
    }

    /// Server-suggested delay before retrying. Only set on rate limits.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StructurifyError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Returns true if the request engine retries this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StructurifyError::Network(_)
                | StructurifyError::Timeout(_)
                | StructurifyError::RateLimit { .. }
        )
    }
}
