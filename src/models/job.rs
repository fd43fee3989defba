use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status of a classification job in the backend queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Expired,
}

impl JobStatus {
    /// No further transition happens once a job reaches one of these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Expired)
    }
}

/// Snapshot of a job as returned by `GET /api/jobs/{id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub position_in_queue: u32,
    /// Advisory, in seconds. Only filled while queued.
    #[serde(default)]
    pub estimated_wait_time: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub has_result: bool,
    #[serde(default)]
    pub has_error: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub email: Option<JobEmail>,
}

impl JobSnapshot {
    pub fn queue_update(&self) -> QueueUpdate {
        QueueUpdate {
            position: self.position_in_queue,
            wait_time_secs: self.estimated_wait_time.unwrap_or(0.0),
        }
    }

    /// The email projection, but only once the job is completed and the
    /// email record itself has finished processing.
    pub fn processed_email(&self) -> Option<&JobEmail> {
        if self.status != JobStatus::Completed {
            return None;
        }
        self.email.as_ref().filter(|email| email.is_processed)
    }
}

/// Projection of the classified email nested in a completed job.
///
/// The backend may attach `{"error": ...}` here when the email row is gone,
/// so every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobEmail {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub is_processed: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a successful `POST /api/submit-email/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Id of the email row created for this submission.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub estimated_wait: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmitResponse {
    pub fn queue_update(&self) -> QueueUpdate {
        QueueUpdate {
            position: self.queue_position.unwrap_or(0),
            wait_time_secs: self.estimated_wait.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueueUpdate {
    pub position: u32,
    pub wait_time_secs: f64,
}

/// Final outcome of a submission: the processed email merged with its ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub job_id: String,
    /// Email id from the submission response.
    pub email_id: Option<i64>,
    pub email: JobEmail,
}

impl ClassificationResult {
    pub fn category(&self) -> &str {
        &self.email.category
    }

    /// Id to open the detail view with; the job's projection wins over the
    /// submission response.
    pub fn detail_id(&self) -> Option<i64> {
        self.email.id.or(self.email_id)
    }
}
