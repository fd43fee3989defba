use std::sync::Mutex;
use std::time::{Duration, Instant};

use console::style;
use strum::Display;

use crate::services::polling::ClassificationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title)
    }
}

impl From<&ClassificationError> for Notice {
    fn from(error: &ClassificationError) -> Self {
        let title = match error {
            ClassificationError::Validation(_) => "Dados inválidos",
            ClassificationError::Connectivity(_) => "Não foi possível conectar ao backend",
            ClassificationError::Timeout { .. } => "Tempo limite excedido",
            ClassificationError::SystemDisabled => "Sistema temporariamente indisponível",
            ClassificationError::Cancelled => "Operação cancelada",
            _ => "Erro ao processar o email",
        };
        let level = match error {
            ClassificationError::Cancelled => NoticeLevel::Info,
            _ => NoticeLevel::Error,
        };
        Notice::new(level, title).with_description(error.to_string())
    }
}

/// Where notices end up.
pub trait NoticeSink: Send + Sync {
    fn deliver(&self, notice: &Notice);
}

/// Prints notices to stderr.
pub struct ConsoleSink;

impl NoticeSink for ConsoleSink {
    fn deliver(&self, notice: &Notice) {
        let title = match notice.level {
            NoticeLevel::Info => style(&notice.title).cyan(),
            NoticeLevel::Success => style(&notice.title).green(),
            NoticeLevel::Warning => style(&notice.title).yellow(),
            NoticeLevel::Error => style(&notice.title).red(),
        };
        match &notice.description {
            Some(description) => eprintln!("{} {}", title.bold(), style(description).dim()),
            None => eprintln!("{}", title.bold()),
        }
    }
}

/// Delivers notices, suppressing repeats of the same backend-offline
/// warning within the cooldown window.
pub struct NoticeBoard {
    sink: Box<dyn NoticeSink>,
    cooldown: Duration,
    last_offline: Mutex<Option<(String, Instant)>>,
}

impl NoticeBoard {
    pub fn new(sink: impl NoticeSink + 'static, cooldown: Duration) -> Self {
        Self {
            sink: Box::new(sink),
            cooldown,
            last_offline: Mutex::new(None),
        }
    }

    pub fn notify(&self, notice: Notice) {
        tracing::debug!(level = %notice.level, title = %notice.title, "Notice");
        self.sink.deliver(&notice);
    }

    /// Returns whether the warning was delivered.
    pub fn notify_offline(&self, description: &str) -> bool {
        self.notify_offline_at(description, Instant::now())
    }

    pub(crate) fn notify_offline_at(&self, description: &str, now: Instant) -> bool {
        {
            let mut last = self
                .last_offline
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some((previous, at)) = last.as_ref() {
                if previous == description && now.saturating_duration_since(*at) < self.cooldown {
                    tracing::trace!("Suppressed duplicate backend-offline notice");
                    return false;
                }
            }
            *last = Some((description.to_string(), now));
        }

        self.notify(Notice::warning("Backend indisponível").with_description(description));
        true
    }
}
