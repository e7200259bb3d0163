//! Background job polling.
//!
//! Exports and imports run as server-side jobs identified by `JOB_ID`. The
//! [`JobPoller`] asks a [`JobStatusSource`] for the status until the job
//! reaches a terminal state, the [`PollPolicy`] is exhausted, or the caller
//! cancels.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{EngageError, Result};

/// Lifecycle state of a background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Queued, not started
    Pending,
    /// In progress
    Running,
    /// Finished successfully
    Complete,
    /// Finished unsuccessfully (error or cancelled on the server)
    Failed,
    /// A status value this client does not know; treated as still running
    Unknown(String),
}

impl JobStatus {
    /// Map a server `JOB_STATUS` value.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "WAITING" | "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "COMPLETE" | "COMPLETED" => Self::Complete,
            "ERROR" | "CANCELED" | "CANCELLED" | "FAILED" => Self::Failed,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Whether polling should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::Running => f.write_str("RUNNING"),
            Self::Complete => f.write_str("COMPLETE"),
            Self::Failed => f.write_str("FAILED"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// One status observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// Job identifier
    pub job_id: String,
    /// Interpreted status
    pub status: JobStatus,
    /// Status as sent by the server
    pub raw_status: String,
    /// `JOB_DESCRIPTION`, if any
    pub description: Option<String>,
}

impl JobReport {
    /// Build a report from the server's raw status text.
    pub fn new(job_id: impl Into<String>, raw_status: impl Into<String>, description: Option<String>) -> Self {
        let raw_status = raw_status.into();
        Self {
            job_id: job_id.into(),
            status: JobStatus::parse(&raw_status),
            raw_status,
            description,
        }
    }
}

/// Anything that can report the status of a job.
///
/// [`EngageClient`](crate::EngageClient) implements this with
/// `<GetJobStatus>`; tests script it.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    /// Fetch the current status of `job_id`. Must not change server state.
    async fn job_status(&self, job_id: &str) -> Result<JobReport>;
}

/// Bounds and pacing for status polling.
///
/// The delay before retry `n` (0-based) is
/// `min(initial_interval * multiplier^n, max_interval)`. Polling stops with
/// [`EngageError::JobTimeout`] after `max_attempts` status queries, or when
/// the next sleep would end past `max_wait`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay after the first non-terminal status
    pub initial_interval: Duration,
    /// Upper bound for the delay
    pub max_interval: Duration,
    /// Growth factor, at least 1.0
    pub multiplier: f64,
    /// Maximum number of status queries
    pub max_attempts: u32,
    /// Maximum total time spent polling
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
            multiplier: 1.5,
            max_attempts: 240,
            max_wait: Some(Duration::from_secs(2 * 60 * 60)),
        }
    }
}

impl PollPolicy {
    /// Constant delay, bounded only by the number of attempts.
    #[must_use]
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            max_attempts: max_attempts.max(1),
            max_wait: None,
        }
    }

    /// Replace the wall-clock bound.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Delay before retry `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = self.initial_interval.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Polls a job until it finishes, then hands the final report to a callback.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    policy: PollPolicy,
}

impl JobPoller {
    /// Create a poller with the given policy.
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll `job_id` until it completes, then run `on_ready` exactly once and
    /// return its result.
    ///
    /// - `Failed` status → [`EngageError::JobFailed`], `on_ready` not called.
    /// - Policy exhausted → [`EngageError::JobTimeout`], `on_ready` not called.
    /// - `cancel` fired → [`EngageError::Cancelled`]. Cancellation is checked
    ///   before each query and interrupts both the query and the sleep.
    /// - Errors from the status source are returned as-is; there is no retry.
    #[instrument(skip_all, fields(job_id = %job_id))]
    pub async fn await_completion<S, F, Fut, T>(
        &self,
        source: &S,
        job_id: &str,
        cancel: &CancellationToken,
        on_ready: F,
    ) -> Result<T>
    where
        S: JobStatusSource + ?Sized,
        F: FnOnce(JobReport) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(job_id));
            }

            attempts += 1;
            let report = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(job_id)),
                report = source.job_status(job_id) => report?,
            };
            debug!(attempt = attempts, status = %report.raw_status, "job status");

            match report.status {
                JobStatus::Complete => {
                    info!(attempts, elapsed = ?started.elapsed(), "job complete");
                    return on_ready(report).await;
                }
                JobStatus::Failed => {
                    warn!(status = %report.raw_status, "job failed");
                    return Err(EngageError::JobFailed {
                        job_id: job_id.to_string(),
                        status: report.raw_status,
                        description: report.description,
                    });
                }
                JobStatus::Unknown(ref raw) => {
                    debug!(status = %raw, "unrecognised job status, still waiting");
                }
                JobStatus::Pending | JobStatus::Running => {}
            }

            let delay = self.policy.delay_for(attempts - 1);
            let elapsed = started.elapsed();
            let out_of_time = self
                .policy
                .max_wait
                .is_some_and(|max_wait| elapsed + delay > max_wait);
            if attempts >= self.policy.max_attempts || out_of_time {
                warn!(attempts, ?elapsed, "job did not finish in time");
                return Err(EngageError::JobTimeout {
                    job_id: job_id.to_string(),
                    attempts,
                    elapsed,
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(job_id)),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

fn cancelled(job_id: &str) -> EngageError {
    info!(job_id, "job polling cancelled");
    EngageError::Cancelled {
        job_id: job_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(JobStatus::parse("WAITING"), JobStatus::Pending);
        assert_eq!(JobStatus::parse("pending"), JobStatus::Pending);
        assert_eq!(JobStatus::parse("RUNNING"), JobStatus::Running);
        assert_eq!(JobStatus::parse("COMPLETE"), JobStatus::Complete);
        assert_eq!(JobStatus::parse("Completed"), JobStatus::Complete);
        assert_eq!(JobStatus::parse("ERROR"), JobStatus::Failed);
        assert_eq!(JobStatus::parse("CANCELED"), JobStatus::Failed);
        assert_eq!(
            JobStatus::parse("PAUSED"),
            JobStatus::Unknown("PAUSED".to_string())
        );
        assert!(!JobStatus::parse("PAUSED").is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_millis(7500));
        assert_eq!(policy.delay_for(10), Duration::from_secs(60));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_fixed_policy() {
        let policy = PollPolicy::fixed(Duration::from_secs(2), 0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(50), Duration::from_secs(2));
        assert_eq!(policy.max_wait, None);
    }

    #[test]
    fn test_report_keeps_raw_status() {
        let report = JobReport::new("77", " Canceled ", Some("Stopped by user".into()));
        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.raw_status, " Canceled ");
    }
}
