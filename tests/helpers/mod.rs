//! In-process mock of the triage backend and other test helpers

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use uuid::Uuid;

use email_triage::{
    models::job::{JobSnapshot, JobStatus, QueueUpdate},
    services::{
        backend::BackendClient,
        notice::{Notice, NoticeSink},
        polling::{PollOptions, ProgressObserver},
    },
};

/// A scripted HTTP answer.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl Canned {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

impl IntoResponse for Canned {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// A file part received by the submit endpoint.
#[derive(Debug, Clone)]
pub struct RecordedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

/// One multipart submission as the backend saw it.
#[derive(Debug, Clone, Default)]
pub struct RecordedSubmission {
    pub fields: HashMap<String, String>,
    pub files: Vec<RecordedFile>,
}

#[derive(Default)]
struct MockState {
    submit_responses: VecDeque<Canned>,
    submit_delay: Option<Duration>,
    jobs: HashMap<String, VecDeque<Canned>>,
    emails: Option<Canned>,
    details: HashMap<i64, Value>,
    status: Option<Canned>,
    usage: Option<Canned>,
    submissions: Vec<RecordedSubmission>,
    submits: usize,
    polls: usize,
    requests: usize,
}

/// Pops the next scripted answer, repeating the last one forever.
fn next_canned(queue: &mut VecDeque<Canned>) -> Option<Canned> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

fn not_found(message: &str) -> Canned {
    Canned::json(StatusCode::NOT_FOUND, json!({ "error": message }))
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock backend bound to an ephemeral local port. Stops when dropped.
pub struct MockBackend {
    pub base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));

        let app = Router::new()
            .route("/api/submit-email/", post(submit_email))
            .route("/api/jobs/{job_id}/", get(job_status))
            .route("/api/emails/", get(list_emails))
            .route("/api/emails/{id}/", get(email_detail))
            .route("/api/status/", get(backend_status))
            .route("/api/usage/", get(api_usage))
            .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend crashed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::with_http(reqwest::Client::new(), &self.base_url, false)
    }

    pub fn on_submit(&self, status: StatusCode, body: Value) {
        lock(&self.state)
            .submit_responses
            .push_back(Canned::json(status, body));
    }

    pub fn on_submit_text(&self, status: StatusCode, body: &str) {
        lock(&self.state)
            .submit_responses
            .push_back(Canned::text(status, body));
    }

    pub fn delay_submit(&self, delay: Duration) {
        lock(&self.state).submit_delay = Some(delay);
    }

    /// Snapshots served in order for `job_id`; the last one repeats.
    pub fn script_job(&self, job_id: &str, snapshots: Vec<Value>) {
        let script = snapshots
            .into_iter()
            .map(|body| Canned::json(StatusCode::OK, body))
            .collect();
        lock(&self.state).jobs.insert(job_id.to_string(), script);
    }

    pub fn script_job_response(&self, job_id: &str, response: Canned) {
        lock(&self.state)
            .jobs
            .insert(job_id.to_string(), VecDeque::from([response]));
    }

    pub fn set_emails(&self, body: Value) {
        lock(&self.state).emails = Some(Canned::json(StatusCode::OK, body));
    }

    pub fn add_email_detail(&self, id: i64, body: Value) {
        lock(&self.state).details.insert(id, body);
    }

    pub fn set_status(&self, response: Canned) {
        lock(&self.state).status = Some(response);
    }

    pub fn set_usage(&self, response: Canned) {
        lock(&self.state).usage = Some(response);
    }

    pub fn submit_count(&self) -> usize {
        lock(&self.state).submits
    }

    pub fn poll_count(&self) -> usize {
        lock(&self.state).polls
    }

    pub fn request_count(&self) -> usize {
        lock(&self.state).requests
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        lock(&self.state).submissions.clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn submit_email(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    let mut recorded = RecordedSubmission::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
                recorded.files.push(RecordedFile {
                    field: name,
                    file_name,
                    content_type,
                    size,
                });
            }
            None => {
                let value = field.text().await.unwrap_or_default();
                recorded.fields.insert(name, value);
            }
        }
    }

    let (response, delay) = {
        let mut state = lock(&state);
        state.requests += 1;
        state.submits += 1;
        state.submissions.push(recorded);
        let response = next_canned(&mut state.submit_responses).unwrap_or_else(|| {
            Canned::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "no submit response scripted" }),
            )
        });
        (response, state.submit_delay)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    response.into_response()
}

async fn job_status(State(state): State<Shared>, Path(job_id): Path<String>) -> Response {
    let mut state = lock(&state);
    state.requests += 1;
    state.polls += 1;
    state
        .jobs
        .get_mut(&job_id)
        .and_then(next_canned)
        .unwrap_or_else(|| not_found("Job não encontrado"))
        .into_response()
}

async fn list_emails(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.requests += 1;
    state
        .emails
        .clone()
        .unwrap_or_else(|| Canned::json(StatusCode::OK, json!([])))
        .into_response()
}

async fn email_detail(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    state.requests += 1;
    let response = match state.details.get(&id) {
        Some(body) => Canned::json(StatusCode::OK, body.clone()),
        None => not_found("Email não encontrado"),
    };
    response.into_response()
}

async fn backend_status(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.requests += 1;
    state
        .status
        .clone()
        .unwrap_or_else(|| Canned::text(StatusCode::SERVICE_UNAVAILABLE, "unavailable"))
        .into_response()
}

async fn api_usage(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    state.requests += 1;
    state
        .usage
        .clone()
        .unwrap_or_else(|| Canned::text(StatusCode::SERVICE_UNAVAILABLE, "unavailable"))
        .into_response()
}

/// Fresh job id in the format the backend hands out.
pub fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn queued(job_id: &str, position: u32, wait: f64) -> Value {
    json!({
        "id": job_id,
        "status": "queued",
        "job_type": "email_classification",
        "position_in_queue": position,
        "estimated_wait_time": wait,
        "created_at": "2025-03-01T10:05:00",
        "has_result": false,
        "has_error": false
    })
}

pub fn processing(job_id: &str) -> Value {
    json!({
        "id": job_id,
        "status": "processing",
        "position_in_queue": 0,
        "created_at": "2025-03-01T10:05:00",
        "started_at": "2025-03-01T10:05:02"
    })
}

pub fn completed(job_id: &str, email_id: i64, category: &str, processed: bool) -> Value {
    json!({
        "id": job_id,
        "status": "completed",
        "created_at": "2025-03-01T10:05:00",
        "started_at": "2025-03-01T10:05:02",
        "completed_at": "2025-03-01T10:05:06",
        "processing_time": 4.1,
        "has_result": true,
        "has_error": false,
        "email": {
            "id": email_id,
            "subject": "Invoice #2291",
            "category": category,
            "confidence_score": 93.0,
            "is_processed": processed
        }
    })
}

pub fn failed(job_id: &str, message: Option<&str>) -> Value {
    json!({
        "id": job_id,
        "status": "failed",
        "has_result": false,
        "has_error": message.is_some(),
        "error_message": message
    })
}

pub fn expired(job_id: &str) -> Value {
    json!({
        "id": job_id,
        "status": "expired",
        "has_result": false,
        "has_error": false
    })
}

/// Poll options that never sleep between polls.
pub fn fast_options(max_attempts: u32) -> PollOptions {
    PollOptions::new(max_attempts, Duration::ZERO)
}

/// Base URL of a local port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe port");
    let addr = listener.local_addr().expect("Probe port has no address");
    drop(listener);
    format!("http://{addr}")
}

/// Observer that remembers every callback.
#[derive(Debug, Default)]
pub struct Recorder {
    pub statuses: Vec<JobStatus>,
    pub queue_updates: Vec<QueueUpdate>,
}

impl ProgressObserver for Recorder {
    fn on_status_update(&mut self, snapshot: &JobSnapshot) {
        self.statuses.push(snapshot.status);
    }

    fn on_queue_update(&mut self, update: QueueUpdate) {
        self.queue_updates.push(update);
    }
}

/// Notice sink that keeps what it was given.
#[derive(Clone, Default)]
pub struct CollectingSink(pub Arc<Mutex<Vec<Notice>>>);

impl CollectingSink {
    pub fn notices(&self) -> Vec<Notice> {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl NoticeSink for CollectingSink {
    fn deliver(&self, notice: &Notice) {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice.clone());
    }
}
