use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

/// Shortest refresh period the telemetry monitors accept.
pub const MIN_REFRESH: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the triage backend (e.g., "http://localhost:8000").
    #[serde(default = "default_api_backend")]
    pub api_backend: String,

    /// When set, the client refuses submissions and telemetry monitors stay idle.
    #[serde(default)]
    pub system_disabled: bool,

    /// Poll budget for a single submission.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Delay between two job status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout applied by the HTTP client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Refresh period of the backend status monitor.
    #[serde(default = "default_status_refresh_secs")]
    pub status_refresh_secs: u64,

    /// Refresh period of the API usage / queue monitor.
    #[serde(default = "default_usage_refresh_secs")]
    pub usage_refresh_secs: u64,

    /// Window during which identical backend-offline notices are suppressed.
    #[serde(default = "default_notice_cooldown_secs")]
    pub notice_cooldown_secs: u64,

    /// Address for the Prometheus scrape endpoint (e.g., "127.0.0.1:9000").
    /// Metrics are only exported when set.
    #[serde(default)]
    pub metrics_addr: Option<String>,
}

fn default_api_backend() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_max_attempts() -> u32 {
    120
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_status_refresh_secs() -> u64 {
    30
}

fn default_usage_refresh_secs() -> u64 {
    5
}

fn default_notice_cooldown_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_backend: default_api_backend(),
            system_disabled: false,
            poll_max_attempts: default_poll_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            status_refresh_secs: default_status_refresh_secs(),
            usage_refresh_secs: default_usage_refresh_secs(),
            notice_cooldown_secs: default_notice_cooldown_secs(),
            metrics_addr: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Defaults pointed at a specific backend.
    pub fn for_backend(api_backend: impl Into<String>) -> Self {
        Self {
            api_backend: api_backend.into(),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Never below [`MIN_REFRESH`]; a zero period is not a valid interval.
    pub fn status_refresh(&self) -> Duration {
        Duration::from_secs(self.status_refresh_secs).max(MIN_REFRESH)
    }

    /// Never below [`MIN_REFRESH`].
    pub fn usage_refresh(&self) -> Duration {
        Duration::from_secs(self.usage_refresh_secs).max(MIN_REFRESH)
    }

    pub fn metrics_listen_addr(&self) -> Result<Option<SocketAddr>, AddrParseError> {
        self.metrics_addr
            .as_deref()
            .filter(|addr| !addr.trim().is_empty())
            .map(|addr| addr.trim().parse())
            .transpose()
    }

    pub fn notice_cooldown(&self) -> Duration {
        Duration::from_secs(self.notice_cooldown_secs)
    }
}
