pub mod client;
pub mod resources;

pub use client::{FilePart, MultipartBody, RequestBody, RequestOptions, StructurifyClient};
pub use resources::{Documents, Exports, Extraction, Projects, Templates};
pub use structurify_core::{
    ClientConfig, ExtractionJob, JobStatus, StructurifyError, WaitOptions, compute_signature,
    verify_signature,
};
