use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Classification categories the backend assigns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Productive,
    Unproductive,
    /// Placeholder stored until the classification job finishes.
    Pending,
}

/// A classified email.
///
/// List responses only carry the summary fields; `content` and
/// `suggested_response` are present on the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Email {
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub suggested_response: Option<String>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Email {
    pub fn category(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    pub fn is_productive(&self) -> bool {
        self.category() == Some(Category::Productive)
    }
}

/// `GET /api/emails/` answers either with an envelope or, on older
/// deployments, with a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EmailListResponse {
    Envelope {
        #[serde(default)]
        success: bool,
        emails: Vec<Email>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        user_ip: Option<String>,
    },
    Bare(Vec<Email>),
}

/// Normalized email history, whatever shape the backend answered with.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailHistory {
    pub emails: Vec<Email>,
    pub count: usize,
    pub user_ip: Option<String>,
}

impl From<EmailListResponse> for EmailHistory {
    fn from(response: EmailListResponse) -> Self {
        match response {
            EmailListResponse::Envelope {
                success,
                emails,
                count,
                user_ip,
            } => {
                if !success {
                    tracing::debug!("email list envelope reported success=false");
                }
                let count = count.unwrap_or(emails.len());
                Self {
                    emails,
                    count,
                    user_ip,
                }
            }
            EmailListResponse::Bare(emails) => Self {
                count: emails.len(),
                emails,
                user_ip: None,
            },
        }
    }
}
