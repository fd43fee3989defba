use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::models::telemetry::{ApiUsage, BackendStatus};
use crate::services::backend::{BackendClient, BackendError};
use crate::services::notice::NoticeBoard;

/// Latest known value of a periodically refreshed snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading<T> {
    Loading,
    Ready(T),
    Unavailable(String),
    /// Monitoring is switched off by configuration.
    Disabled,
}

impl<T> Reading<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Background refresh of backend status (slow) and API usage (fast).
///
/// Readers get whatever was fetched last; values may be one period stale.
/// Refresh tasks stop on [`TelemetryMonitor::shutdown`] or when the monitor
/// is dropped.
pub struct TelemetryMonitor {
    status: watch::Receiver<Reading<BackendStatus>>,
    usage: watch::Receiver<Reading<ApiUsage>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl TelemetryMonitor {
    pub fn spawn(client: Arc<BackendClient>, config: &AppConfig, notices: Arc<NoticeBoard>) -> Self {
        let cancel = CancellationToken::new();

        if config.system_disabled || client.is_disabled() {
            tracing::info!("Backend disabled by configuration, telemetry monitors idle");
            let (_, status) = watch::channel(Reading::Disabled);
            let (_, usage) = watch::channel(Reading::Disabled);
            return Self {
                status,
                usage,
                cancel,
                tasks: Vec::new(),
            };
        }

        let (status_tx, status) = watch::channel(Reading::Loading);
        let (usage_tx, usage) = watch::channel(Reading::Loading);

        let status_client = client.clone();
        let status_task = spawn_refresh(
            "status",
            config.status_refresh(),
            cancel.clone(),
            status_tx,
            Some(notices),
            move || {
                let client = status_client.clone();
                async move { client.status().await }
            },
        );

        let usage_task = spawn_refresh(
            "usage",
            config.usage_refresh(),
            cancel.clone(),
            usage_tx,
            None,
            move || {
                let client = client.clone();
                async move { client.usage().await }
            },
        );

        Self {
            status,
            usage,
            cancel,
            tasks: vec![status_task, usage_task],
        }
    }

    pub fn status(&self) -> Reading<BackendStatus> {
        self.status.borrow().clone()
    }

    pub fn usage(&self) -> Reading<ApiUsage> {
        self.usage.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Reading<BackendStatus>> {
        self.status.clone()
    }

    pub fn subscribe_usage(&self) -> watch::Receiver<Reading<ApiUsage>> {
        self.usage.clone()
    }

    /// Stop both refresh loops and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Telemetry task ended abnormally");
            }
        }
    }
}

impl Drop for TelemetryMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn spawn_refresh<T, F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<Reading<T>>,
    offline_notices: Option<Arc<NoticeBoard>>,
    fetch: F,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, BackendError>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let reading = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = fetch() => match result {
                    Ok(value) => Reading::Ready(value),
                    Err(e) => {
                        tracing::warn!(monitor = name, error = %e, "Telemetry refresh failed");
                        if let Some(notices) = &offline_notices {
                            notices.notify_offline(&e.to_string());
                        }
                        Reading::Unavailable(e.to_string())
                    }
                },
            };

            if tx.send(reading).is_err() {
                break;
            }
        }

        tracing::debug!(monitor = name, "Telemetry refresh stopped");
    })
}
