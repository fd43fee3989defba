use crate::models::job::{JobSnapshot, JobStatus, QueueUpdate};
use crate::services::format;

/// What the submission screen shows for the latest job snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub stage: &'static str,
    pub message: String,
    pub percent: u8,
    pub job_id: Option<String>,
    pub position: Option<u32>,
    pub wait_time_secs: Option<f64>,
}

impl ProgressView {
    /// State before the backend has answered.
    pub fn sending() -> Self {
        Self {
            stage: "enviando",
            message: "Enviando dados para classificação...".to_string(),
            percent: 10,
            job_id: None,
            position: None,
            wait_time_secs: None,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: &JobSnapshot) {
        let (stage, message, percent) = match snapshot.status {
            JobStatus::Queued => (
                "enfileirado",
                "Na fila de processamento...".to_string(),
                queued_percent(snapshot.position_in_queue),
            ),
            JobStatus::Processing => ("processando", "Classificando email com IA...".to_string(), 60),
            JobStatus::Completed => match snapshot.processed_email() {
                Some(email) => (
                    "concluído",
                    format!(
                        "Email classificado como {}!",
                        format::format_category(&email.category).to_lowercase()
                    ),
                    100,
                ),
                None => ("finalizando", "Finalizando processamento...".to_string(), 80),
            },
            JobStatus::Failed => (
                "falhou",
                snapshot
                    .error_message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Falha no processamento".to_string()),
                0,
            ),
            JobStatus::Expired => (
                "expirado",
                "Tempo limite de processamento excedido".to_string(),
                0,
            ),
        };

        self.stage = stage;
        self.message = message;
        self.percent = percent;
        self.job_id = Some(snapshot.id.clone());
    }

    pub fn apply_queue(&mut self, update: QueueUpdate) {
        self.position = Some(update.position);
        self.wait_time_secs = Some(update.wait_time_secs);
        self.message = format!("Na fila: posição {}", update.position);
    }

    /// One status line for terminal output.
    pub fn render(&self) -> String {
        let mut line = format!("[{:>3}%] {}: {}", self.percent, self.stage, self.message);
        if self.stage == "enfileirado" {
            if let Some(wait) = self.wait_time_secs.filter(|w| *w > 0.0) {
                line.push_str(&format!(" (espera estimada: ~{})", format::format_wait(wait)));
            }
        }
        line
    }
}

/// Queued jobs creep from 10 % towards 30 % with their position.
fn queued_percent(position: u32) -> u8 {
    position.saturating_mul(2).saturating_add(10).min(30) as u8
}
