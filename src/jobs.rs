//! Asynchronous job polling.
//!
//! Mutating commands answer with a job identifier. The poller queries
//! `queryAsyncJobResult` until the job reaches a terminal status, the
//! deadline passes, or the owning view cancels it.

use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{ApiCommand, ApiError, ControlPlane};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(600);

/// Opaque identifier of a server-side job.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct JobId(String);

impl JobId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported for a job.
#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
    /// Still running.
    Pending,
    /// Finished successfully; carries `jobresult`.
    Succeeded(Value),
    /// Finished with an error.
    Failed {
        /// Error code reported in the job result.
        code: u32,
        /// Error text reported in the job result.
        message: String,
    },
}

impl JobStatus {
    /// Interprets a `queryasyncjobresultresponse` body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MalformedResponse`] for an unknown status code.
    pub fn from_body(command: &ApiCommand, body: &Value) -> Result<Self, ApiError> {
        match body.get("jobstatus").and_then(Value::as_u64) {
            Some(0) => Ok(Self::Pending),
            Some(1) => Ok(Self::Succeeded(
                body.get("jobresult").cloned().unwrap_or(Value::Null),
            )),
            Some(2) => {
                let result = body.get("jobresult");
                let code = result
                    .and_then(|res| res.get("errorcode"))
                    .and_then(Value::as_u64)
                    .or_else(|| body.get("jobresultcode").and_then(Value::as_u64))
                    .unwrap_or(0);
                let message = result
                    .and_then(|res| res.get("errortext"))
                    .and_then(Value::as_str)
                    .unwrap_or("job failed")
                    .to_owned();
                Ok(Self::Failed {
                    code: u32::try_from(code).unwrap_or(u32::MAX),
                    message,
                })
            }
            other => Err(ApiError::MalformedResponse {
                command: command.name().to_owned(),
                message: format!("unexpected jobstatus {other:?}"),
            }),
        }
    }

    /// True for succeeded and failed jobs.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Errors raised while waiting for a job.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PollError {
    /// Raised when a status query fails.
    #[error("failed to query job status: {0}")]
    Api(#[from] ApiError),
    /// Raised when the job reports failure.
    #[error("job {job_id} failed: {message}")]
    JobFailed {
        /// Job identifier.
        job_id: JobId,
        /// Error code from the job result.
        code: u32,
        /// Error text from the job result.
        message: String,
    },
    /// Raised when the job does not finish before the deadline.
    #[error("timeout waiting for job {job_id}")]
    Timeout {
        /// Job identifier.
        job_id: JobId,
    },
    /// Raised when the owning view cancelled the poll.
    #[error("polling job {job_id} was cancelled")]
    Cancelled {
        /// Job identifier.
        job_id: JobId,
    },
}

/// Bounded polling loop over `queryAsyncJobResult`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct JobPoller {
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT)
    }
}

impl JobPoller {
    /// Creates a poller with explicit interval and deadline.
    #[must_use]
    pub const fn new(poll_interval: Duration, wait_timeout: Duration) -> Self {
        Self {
            poll_interval,
            wait_timeout,
        }
    }

    /// Builds the status query for a job.
    #[must_use]
    pub fn status_command(job_id: &JobId) -> ApiCommand {
        ApiCommand::new("queryAsyncJobResult").param("jobid", job_id.as_str())
    }

    /// Queries a job once.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the query.
    pub async fn status<C>(api: &C, job_id: &JobId) -> Result<JobStatus, ApiError>
    where
        C: ControlPlane + ?Sized,
    {
        let command = Self::status_command(job_id);
        let body = api.call(&command).await?;
        JobStatus::from_body(&command, &body)
    }

    /// Polls until the job finishes and returns its `jobresult`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::JobFailed`] when the job reports failure,
    /// [`PollError::Timeout`] when the deadline passes,
    /// [`PollError::Cancelled`] when `cancel` fires, and [`PollError::Api`]
    /// when a status query fails.
    pub async fn wait<C>(
        &self,
        api: &C,
        job_id: &JobId,
        cancel: &CancellationToken,
    ) -> Result<Value, PollError>
    where
        C: ControlPlane + ?Sized,
    {
        let deadline = Instant::now() + self.wait_timeout;
        let mut attempts: u32 = 0;

        while Instant::now() <= deadline {
            if cancel.is_cancelled() {
                return Err(PollError::Cancelled {
                    job_id: job_id.clone(),
                });
            }

            attempts = attempts.saturating_add(1);
            let status = tokio::select! {
                () = cancel.cancelled() => {
                    return Err(PollError::Cancelled { job_id: job_id.clone() });
                }
                status = Self::status(api, job_id) => status?,
            };
            debug!(job = %job_id, attempts, terminal = status.is_terminal(), "polled job");

            match status {
                JobStatus::Succeeded(result) => {
                    info!(job = %job_id, attempts, "job succeeded");
                    return Ok(result);
                }
                JobStatus::Failed { code, message } => {
                    info!(job = %job_id, code, error = %message, "job failed");
                    return Err(PollError::JobFailed {
                        job_id: job_id.clone(),
                        code,
                        message,
                    });
                }
                JobStatus::Pending => {}
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    return Err(PollError::Cancelled { job_id: job_id.clone() });
                }
                () = sleep(self.poll_interval) => {}
            }
        }

        Err(PollError::Timeout {
            job_id: job_id.clone(),
        })
    }
}
