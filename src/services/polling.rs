use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::models::job::{ClassificationResult, JobSnapshot, JobStatus, QueueUpdate};
use crate::models::submission::EmailSubmission;
use crate::services::backend::{BackendClient, BackendError};
use crate::services::validation::{self, ValidationError};

const DEFAULT_MAX_ATTEMPTS: u32 = 60;
const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Poll budget and cancellation for one submission.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub interval: Duration,
    pub cancel: CancellationToken,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }
}

impl PollOptions {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.poll_max_attempts, config.poll_interval())
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Receives progress while a submission is being followed.
///
/// Callbacks run in poll order on the polling task. Both default to no-ops.
pub trait ProgressObserver {
    /// Every snapshot, once per poll.
    fn on_status_update(&mut self, _snapshot: &JobSnapshot) {}

    /// Queue position or estimated wait changed. Only emitted while queued.
    fn on_queue_update(&mut self, _update: QueueUpdate) {}
}

impl ProgressObserver for () {}

/// Submit an email and follow its job until the classification is final.
///
/// The result is only returned once the job is `completed` and its email
/// reports `is_processed`; a completed job whose email is still pending
/// keeps being polled. `failed` and `expired` stop immediately. Running out
/// of `max_attempts` yields [`ClassificationError::Timeout`].
pub async fn submit_and_await_result<O>(
    client: &BackendClient,
    submission: &EmailSubmission,
    options: &PollOptions,
    observer: &mut O,
) -> Result<ClassificationResult, ClassificationError>
where
    O: ProgressObserver + ?Sized,
{
    if client.is_disabled() {
        return Err(ClassificationError::SystemDisabled);
    }
    validation::validate_submission(submission)?;

    let started = Instant::now();
    metrics::counter!("triage_submissions_total").increment(1);

    let accepted = cancellable(&options.cancel, client.submit_email(submission)).await?;
    let job_id = accepted
        .job_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or(ClassificationError::MissingJobId)?;

    let initial = accepted.queue_update();
    info!(
        job_id = %job_id,
        email_id = ?accepted.id,
        queue_position = initial.position,
        "Email submitted for classification"
    );
    observer.on_queue_update(initial);
    let mut last_queue = initial;

    for attempt in 1..=options.max_attempts {
        let snapshot = cancellable(&options.cancel, client.job_status(&job_id)).await?;
        metrics::counter!("triage_polls_total").increment(1);
        debug!(job_id = %job_id, attempt, status = %snapshot.status, "Polled job status");

        observer.on_status_update(&snapshot);

        match snapshot.status {
            JobStatus::Queued => {
                let update = snapshot.queue_update();
                if update != last_queue {
                    observer.on_queue_update(update);
                    last_queue = update;
                }
            }
            JobStatus::Completed => {
                if let Some(email) = snapshot.processed_email() {
                    metrics::counter!("triage_jobs_completed").increment(1);
                    metrics::histogram!("triage_wait_seconds")
                        .record(started.elapsed().as_secs_f64());
                    info!(job_id = %job_id, category = %email.category, attempt, "Classification finished");
                    return Ok(ClassificationResult {
                        job_id,
                        email_id: accepted.id,
                        email: email.clone(),
                    });
                }
                debug!(job_id = %job_id, "Job completed, waiting for the email to finish processing");
            }
            JobStatus::Failed | JobStatus::Expired => {
                metrics::counter!("triage_jobs_failed").increment(1);
                let message = snapshot
                    .error_message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| fallback_failure_message(snapshot.status));
                warn!(job_id = %job_id, status = %snapshot.status, message = %message, "Classification job failed");
                return Err(ClassificationError::JobFailed {
                    job_id,
                    status: snapshot.status,
                    message,
                });
            }
            JobStatus::Processing => {}
        }

        if attempt < options.max_attempts {
            tokio::select! {
                biased;
                _ = options.cancel.cancelled() => return Err(ClassificationError::Cancelled),
                _ = tokio::time::sleep(options.interval) => {}
            }
        }
    }

    metrics::counter!("triage_jobs_timed_out").increment(1);
    warn!(job_id = %job_id, attempts = options.max_attempts, "Gave up waiting for classification");
    Err(ClassificationError::Timeout {
        job_id,
        attempts: options.max_attempts,
    })
}

/// Register descriptions for the metrics emitted while following jobs.
///
/// Call after a recorder is installed; without one, every metric in this
/// module is a no-op.
pub fn describe_metrics() {
    metrics::describe_counter!("triage_submissions_total", "Emails submitted for classification");
    metrics::describe_counter!("triage_polls_total", "Job status requests sent");
    metrics::describe_counter!("triage_jobs_completed", "Jobs that produced a classification");
    metrics::describe_counter!("triage_jobs_failed", "Jobs that ended failed or expired");
    metrics::describe_counter!("triage_jobs_timed_out", "Jobs abandoned after the poll budget ran out");
    metrics::describe_histogram!(
        "triage_wait_seconds",
        metrics::Unit::Seconds,
        "Time from submission to final classification"
    );
}

/// Message used when a job fails without saying why.
pub fn fallback_failure_message(status: JobStatus) -> String {
    format!("Job falhou com status: {status}")
}

async fn cancellable<T, F>(cancel: &CancellationToken, request: F) -> Result<T, ClassificationError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClassificationError::Cancelled),
        result = request => result.map_err(ClassificationError::from),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not reach the triage backend: {0}")]
    Connectivity(#[source] reqwest::Error),

    #[error("{message}")]
    Backend { status: StatusCode, message: String },

    #[error("Unexpected response from the triage backend: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Job ID not provided by the backend")]
    MissingJobId,

    #[error("{message}")]
    JobFailed {
        job_id: String,
        status: JobStatus,
        message: String,
    },

    #[error("Timed out after {attempts} status checks")]
    Timeout { job_id: String, attempts: u32 },

    #[error("Cancelled before the classification finished")]
    Cancelled,

    #[error("The triage backend is temporarily disabled")]
    SystemDisabled,
}

impl From<BackendError> for ClassificationError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Connectivity(e) | BackendError::Form(e) => Self::Connectivity(e),
            BackendError::Status { status, message } => Self::Backend { status, message },
            BackendError::Decode(e) => Self::Decode(e),
        }
    }
}

impl ClassificationError {
    /// Whether the job may still finish server-side after this error.
    pub fn job_may_still_complete(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled)
    }
}
