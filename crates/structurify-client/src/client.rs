use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use structurify_core::config::ClientConfig;
use structurify_core::error::StructurifyError;
use structurify_core::job::ExtractionJob;
use structurify_core::traits::JobSource;
use url::Url;

use crate::resources::{Documents, Exports, Extraction, Projects, Templates};

const USER_AGENT: &str = concat!("structurify-rust/", env!("CARGO_PKG_VERSION"));

/// Payload of a request. JSON and raw bodies are mutually exclusive.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Sent as-is, e.g. a binary upload.
    Raw {
        bytes: Vec<u8>,
        content_type: String,
    },
    /// `multipart/form-data`, rebuilt into a fresh form for every attempt.
    Multipart(MultipartBody),
}

/// Text fields and file parts of a `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
            mime_type: mime_type.into(),
        });
        self
    }

    fn to_form(&self) -> Result<Form, StructurifyError> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    StructurifyError::InvalidArgument(format!(
                        "Invalid MIME type '{}': {e}",
                        file.mime_type
                    ))
                })?;
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }
}

/// Per-call request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, StructurifyError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn raw(mut self, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Raw {
            bytes,
            content_type: content_type.into(),
        };
        self
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }
}

/// Client for the Structurify extraction API.
///
/// Every call goes through [`request`](Self::request), which applies
/// authentication, the per-attempt timeout, retries with exponential backoff,
/// and maps non-2xx responses to [`StructurifyError`].
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct StructurifyClient {
    http: Client,
    config: ClientConfig,
}

impl StructurifyClient {
    pub fn new(config: ClientConfig) -> Result<Self, StructurifyError> {
        config.validate()?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| StructurifyError::Http(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Shorthand for `ClientConfig::new(api_key)` with all defaults.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, StructurifyError> {
        Self::new(ClientConfig::new(api_key)?)
    }

    /// Build a client from `STRUCTURIFY_*` environment variables.
    pub fn from_env() -> Result<Self, StructurifyError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn templates(&self) -> Templates<'_> {
        Templates::new(self)
    }

    pub fn projects(&self) -> Projects<'_> {
        Projects::new(self)
    }

    pub fn documents(&self) -> Documents<'_> {
        Documents::new(self)
    }

    pub fn extraction(&self) -> Extraction<'_> {
        Extraction::new(self)
    }

    pub fn exports(&self) -> Exports<'_> {
        Exports::new(self)
    }

    /// Perform one logical API call, retrying transient failures.
    ///
    /// Timeouts and connect failures are retried after `base * 2^attempt`.
    /// Rate limits are retried after the server's `Retry-After` when present.
    /// Once retries are exhausted the last error is returned as-is; any other
    /// error is returned immediately. A 2xx body is returned undecoded.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<serde_json::Value, StructurifyError> {
        let url = self.build_url(path, &options.query)?;
        self.execute(method, url, &options.body).await
    }

    /// Same as [`request`](Self::request), with the path given as segments.
    /// Each segment is percent-encoded, so ids containing `/`, `?` or `#`
    /// stay inside their own segment.
    pub async fn request_segments(
        &self,
        method: Method,
        segments: &[&str],
        options: RequestOptions,
    ) -> Result<serde_json::Value, StructurifyError> {
        let url = self.build_segment_url(segments, &options.query)?;
        self.execute(method, url, &options.body).await
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: &RequestBody,
    ) -> Result<serde_json::Value, StructurifyError> {
        let policy = self.config.retry_policy();
        let mut attempt: u32 = 0;

        loop {
            tracing::debug!(%method, %url, attempt, "Sending request");

            let err = match self.send_once(method.clone(), url.clone(), body).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            if !err.is_retryable() || !policy.should_retry(attempt) {
                return Err(err);
            }

            let delay = match &err {
                StructurifyError::RateLimit { retry_after, .. } => {
                    policy.delay_for_rate_limit(attempt, *retry_after)
                }
                _ => policy.delay_for_attempt(attempt),
            };

            tracing::warn!(
                %method,
                %url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Request failed, retrying"
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, StructurifyError> {
        let mut options = RequestOptions::new();
        for (key, value) in query {
            options = options.query(*key, *value);
        }
        let body = self.request_segments(Method::GET, segments, options).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, StructurifyError> {
        let options = RequestOptions::new().json(body)?;
        let body = self.request_segments(Method::POST, segments, options).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, StructurifyError> {
        let options = RequestOptions::new().json(body)?;
        let body = self.request_segments(Method::PUT, segments, options).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, StructurifyError> {
        let body = self
            .request_segments(Method::DELETE, segments, RequestOptions::new())
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<Url, StructurifyError> {
        let url = Url::parse(&format!("{}{}", self.config.base_url(), path)).map_err(|e| {
            StructurifyError::InvalidArgument(format!("Invalid request URL for path '{path}': {e}"))
        })?;
        Ok(append_query(url, query))
    }

    fn build_segment_url(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<Url, StructurifyError> {
        let mut url = Url::parse(self.config.base_url()).map_err(|e| {
            StructurifyError::InvalidArgument(format!(
                "Invalid base URL '{}': {e}",
                self.config.base_url()
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                StructurifyError::InvalidArgument(format!(
                    "Base URL '{}' cannot carry a path",
                    self.config.base_url()
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(append_query(url, query))
    }

    /// One attempt: send, read the body, classify.
    async fn send_once(
        &self,
        method: Method,
        url: Url,
        body: &RequestBody,
    ) -> Result<serde_json::Value, StructurifyError> {
        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(self.config.api_key());

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Raw {
                bytes,
                content_type,
            } => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(bytes.clone()),
            RequestBody::Multipart(multipart) => builder.multipart(multipart.to_form()?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let body = parse_body(&text);

        if status.is_success() {
            Ok(body)
        } else {
            tracing::debug!(status = status.as_u16(), "API returned an error response");
            Err(StructurifyError::from_response(
                status.as_u16(),
                body,
                retry_after,
            ))
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> StructurifyError {
        if e.is_timeout() {
            StructurifyError::Timeout(self.config.timeout())
        } else if e.is_connect() {
            StructurifyError::Network(format!("Connection failed: {e}"))
        } else {
            StructurifyError::Http(e.to_string())
        }
    }
}

impl JobSource for StructurifyClient {
    async fn get_job(&self, job_id: &str) -> Result<ExtractionJob, StructurifyError> {
        self.extraction().get(job_id).await
    }
}

fn append_query(mut url: Url, query: &[(String, String)]) -> Url {
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    url
}

/// `Retry-After` as integer seconds. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Decode a response body, falling back to a synthetic error payload for
/// non-JSON text.
fn parse_body(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| {
        serde_json::json!({
            "error": "InvalidResponse",
            "message": text,
        })
    })
}
