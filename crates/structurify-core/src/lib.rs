pub mod config;
pub mod error;
pub mod job;
pub mod models;
pub mod poller;
pub mod traits;
pub mod util;
pub mod webhook;


pub use config::{ClientConfig, RetryPolicy};
pub use error::{Result, StructurifyError};
pub use job::{ExtractionJob, JobStatus, WaitOptions};
pub use poller::wait_for_completion;
pub use traits::JobSource;
pub use webhook::{compute_signature, verify_signature};
