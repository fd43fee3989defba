use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::models::email::{Email, EmailHistory, EmailListResponse};
use crate::models::job::{JobSnapshot, SubmitResponse};
use crate::models::submission::EmailSubmission;
use crate::models::telemetry::{ApiUsage, BackendStatus};

/// HTTP client for the triage backend's JSON API.
pub struct BackendClient {
    http: Client,
    base_url: String,
    disabled: bool,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(BackendError::Connectivity)?;

        Ok(Self::with_http(http, &config.api_backend, config.system_disabled))
    }

    pub fn with_http(http: Client, base_url: &str, disabled: bool) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            disabled,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set from configuration when the backend has been switched off.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST /api/submit-email/: multipart submission, answers with a job id.
    pub async fn submit_email(
        &self,
        submission: &EmailSubmission,
    ) -> Result<SubmitResponse, BackendError> {
        let mut form = Form::new();
        for (name, value) in submission.form_fields() {
            form = form.text(name, value);
        }

        if let Some(attachment) = submission.upload() {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.mime_type)
                .map_err(BackendError::Form)?;
            form = form.part("file", part);
        }

        let response = self
            .http
            .post(self.url("/api/submit-email/"))
            .multipart(form)
            .send()
            .await?;

        read_json(response).await
    }

    /// GET /api/jobs/{job_id}/
    pub async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, BackendError> {
        let response = self
            .http
            .get(self.url(&format!("/api/jobs/{job_id}/")))
            .send()
            .await?;

        read_json(response).await
    }

    /// GET /api/emails/, normalized into one shape right away.
    pub async fn list_emails(&self) -> Result<EmailHistory, BackendError> {
        let response = self.http.get(self.url("/api/emails/")).send().await?;
        let listing: EmailListResponse = read_json(response).await?;
        Ok(EmailHistory::from(listing))
    }

    /// GET /api/emails/{id}/
    pub async fn email_detail(&self, id: i64) -> Result<Email, BackendError> {
        let response = self
            .http
            .get(self.url(&format!("/api/emails/{id}/")))
            .send()
            .await?;

        read_json(response).await
    }

    /// GET /api/status/
    pub async fn status(&self) -> Result<BackendStatus, BackendError> {
        let response = self.http.get(self.url("/api/status/")).send().await?;
        read_json(response).await
    }

    /// GET /api/usage/
    pub async fn usage(&self) -> Result<ApiUsage, BackendError> {
        let response = self.http.get(self.url("/api/usage/")).send().await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::debug!(status = %status, body = %body, "Backend returned an error status");
        return Err(BackendError::Status {
            status,
            message: error_message(status, &body),
        });
    }

    serde_json::from_str(&body).map_err(BackendError::Decode)
}

/// Message to show for a non-2xx answer: the JSON `message` or `error`
/// field when there is one, else the bare status line.
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error", "errors"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Could not reach the triage backend: {0}")]
    Connectivity(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Unexpected response from the triage backend: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Could not build the submission form: {0}")]
    Form(#[source] reqwest::Error),
}

impl BackendError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
