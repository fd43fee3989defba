use serde::{Deserialize, Serialize};

use crate::models::job::JobSnapshot;

/// Usage above this share of a quota is flagged as high.
pub const HIGH_USAGE_PERCENT: f64 = 80.0;

/// Snapshot from `GET /api/status/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub database: Option<DatabaseStatus>,
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
    #[serde(default)]
    pub debug_mode: bool,
}

impl BackendStatus {
    pub fn is_online(&self) -> bool {
        self.status == "online"
    }

    pub fn database_connected(&self) -> bool {
        self.database
            .as_ref()
            .is_some_and(DatabaseStatus::is_connected)
    }
}

/// Deployments report the database either as a bare string or as an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatabaseStatus {
    Detailed {
        status: String,
        #[serde(default)]
        engine: Option<String>,
    },
    Plain(String),
}

impl DatabaseStatus {
    pub fn is_connected(&self) -> bool {
        match self {
            Self::Detailed { status, .. } | Self::Plain(status) => status == "connected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
}

/// Snapshot from `GET /api/usage/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUsage {
    #[serde(rename = "gemini_api")]
    pub quota: QuotaStats,
    pub job_queue: QueueStats,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ApiUsage {
    pub fn is_high_usage(&self) -> bool {
        self.quota.minute_percent > HIGH_USAGE_PERCENT || self.quota.day_percent > HIGH_USAGE_PERCENT
    }
}

/// LLM API quota consumption, per minute and per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaStats {
    pub minute_usage: u64,
    pub minute_limit: u64,
    pub minute_percent: f64,
    pub day_usage: u64,
    pub day_limit: u64,
    pub day_percent: f64,
    #[serde(default)]
    pub total_today: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub queue_length: u32,
    #[serde(default)]
    pub active_job: Option<JobSnapshot>,
    #[serde(default)]
    pub estimated_wait: f64,
    /// At most the first five queued jobs.
    #[serde(default)]
    pub queued_jobs: Vec<JobSnapshot>,
    #[serde(default)]
    pub processing_count: u32,
}

impl QueueStats {
    pub fn is_idle(&self) -> bool {
        self.queued_jobs.is_empty() && self.active_job.is_none()
    }
}
