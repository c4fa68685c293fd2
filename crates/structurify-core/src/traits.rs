use std::future::Future;

use crate::error::StructurifyError;
use crate::job::ExtractionJob;

/// Fetches the current state of an extraction job.
///
/// Implemented by the HTTP client; the poller only depends on this seam.
pub trait JobSource: Send + Sync {
    fn get_job(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<ExtractionJob, StructurifyError>> + Send;
}
