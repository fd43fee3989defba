use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    backend::{BackendClient, BackendError},
    notice::{NoticeBoard, NoticeSink},
    polling::PollOptions,
    telemetry::TelemetryMonitor,
};

/// Shared client state handed to every command.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<BackendClient>,
    pub notices: Arc<NoticeBoard>,
}

impl AppState {
    pub fn new(config: AppConfig, sink: impl NoticeSink + 'static) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config)?;
        let notices = NoticeBoard::new(sink, config.notice_cooldown());
        Ok(Self {
            config: Arc::new(config),
            backend: Arc::new(backend),
            notices: Arc::new(notices),
        })
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions::from_config(&self.config)
    }

    pub fn spawn_telemetry(&self) -> TelemetryMonitor {
        TelemetryMonitor::spawn(self.backend.clone(), &self.config, self.notices.clone())
    }
}
