//! Waiting for an extraction job to reach a terminal state.
//!
//! The poller never drives job transitions. It samples the job through a
//! [`JobSource`] until the status is `done`, `error` or `cancelled`, or until
//! the overall deadline passes.
//!
//! ```text
//! pending ──► processing ──► done
//!    │             │    └──► error
//!    └─────────────┴───────► cancelled
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::error::StructurifyError;
use crate::job::{ExtractionJob, JobStatus, WaitOptions};
use crate::traits::JobSource;

/// Events emitted while polling, for monitoring/logging.
#[derive(Debug, Clone)]
pub enum PollEvent<'a> {
    Started {
        job_id: &'a str,
        options: &'a WaitOptions,
    },
    Sampled {
        job: &'a ExtractionJob,
        elapsed: Duration,
    },
    Completed {
        job: &'a ExtractionJob,
        elapsed: Duration,
    },
    TimedOut {
        job_id: &'a str,
        status: JobStatus,
        elapsed: Duration,
    },
}

/// Trait for receiving poll events (decoupled logging).
pub trait PollReporter: Send + Sync {
    fn report(&self, event: PollEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPollReporter;

impl PollReporter for TracingPollReporter {
    fn report(&self, event: PollEvent<'_>) {
        match event {
            PollEvent::Started { job_id, options } => {
                tracing::debug!(
                    %job_id,
                    timeout_ms = options.timeout.as_millis() as u64,
                    poll_interval_ms = options.poll_interval.as_millis() as u64,
                    "Waiting for extraction job"
                );
            }
            PollEvent::Sampled { job, elapsed } => {
                tracing::debug!(
                    job_id = %job.id,
                    status = %job.status,
                    progress = job.progress,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Job still running"
                );
            }
            PollEvent::Completed { job, elapsed } => {
                tracing::info!(
                    job_id = %job.id,
                    status = %job.status,
                    completed_tasks = job.completed_tasks,
                    total_tasks = job.total_tasks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Job finished"
                );
            }
            PollEvent::TimedOut {
                job_id,
                status,
                elapsed,
            } => {
                tracing::warn!(
                    %job_id,
                    %status,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Gave up waiting for job"
                );
            }
        }
    }
}

/// Poll `job_id` until it is terminal, logging through `tracing`.
pub async fn wait_for_completion<S: JobSource>(
    source: &S,
    job_id: &str,
    options: WaitOptions,
) -> Result<ExtractionJob, StructurifyError> {
    wait_for_completion_with_reporter(source, job_id, options, &TracingPollReporter).await
}

/// Poll `job_id` until it is terminal.
///
/// Errors from `source` abort polling unchanged. If the deadline passes
/// first, fails with [`StructurifyError::JobTimeout`] carrying the last
/// observed status and progress.
pub async fn wait_for_completion_with_reporter<S, R>(
    source: &S,
    job_id: &str,
    options: WaitOptions,
    reporter: &R,
) -> Result<ExtractionJob, StructurifyError>
where
    S: JobSource,
    R: PollReporter,
{
    options.validate()?;

    let start = Instant::now();
    reporter.report(PollEvent::Started {
        job_id,
        options: &options,
    });

    loop {
        let job = source.get_job(job_id).await?;
        let elapsed = start.elapsed();

        if job.is_terminal() {
            reporter.report(PollEvent::Completed { job: &job, elapsed });
            return Ok(job);
        }

        reporter.report(PollEvent::Sampled { job: &job, elapsed });

        if elapsed >= options.timeout {
            reporter.report(PollEvent::TimedOut {
                job_id,
                status: job.status,
                elapsed,
            });
            return Err(StructurifyError::JobTimeout {
                job_id: job_id.to_string(),
                timeout: options.timeout,
                status: job.status,
                progress: job.progress,
            });
        }

        tokio::time::sleep(options.poll_interval).await;
    }
}
