//! Canned backend payloads shared by the integration tests

#![allow(dead_code)]

use serde_json::{json, Value};

/// A submitted email together with what the backend should classify it as.
#[derive(Debug, Clone)]
pub struct TestEmailFixture {
    pub sender: &'static str,
    pub subject: &'static str,
    pub content: &'static str,
    pub expected_category: &'static str,
    pub description: &'static str,
}

pub const TEST_EMAILS: &[TestEmailFixture] = &[
    TestEmailFixture {
        sender: "financeiro@acme.com.br",
        subject: "Invoice #2291",
        content: "Please review the attached invoice",
        expected_category: "productive",
        description: "Billing request that needs an answer",
    },
    TestEmailFixture {
        sender: "maria.silva@example.com",
        subject: "Feliz Natal!",
        content: "Desejo a todos um feliz natal e um próspero ano novo.",
        expected_category: "unproductive",
        description: "Holiday greeting",
    },
    TestEmailFixture {
        sender: "suporte@cliente.com",
        subject: "Status do chamado 4471",
        content: "Gostaria de saber o andamento do chamado aberto na semana passada.",
        expected_category: "productive",
        description: "Support ticket follow-up",
    },
];

/// Accepted-submission body.
pub fn submit_accepted(email_id: i64, job_id: &str, position: u32, wait: f64) -> Value {
    json!({
        "id": email_id,
        "job_id": job_id,
        "queue_position": position,
        "estimated_wait": wait,
        "status": "queued",
        "message": "Email enviado para processamento"
    })
}

/// One history row as returned by the list endpoint.
pub fn email_row(id: i64, subject: &str, sender: &str, category: &str) -> Value {
    json!({
        "id": id,
        "subject": subject,
        "sender": sender,
        "category": category,
        "confidence_score": 91.0,
        "created_at": "2025-03-01T10:05:00Z"
    })
}

/// Full detail payload for one email.
pub fn email_detail(id: i64, category: &str) -> Value {
    json!({
        "id": id,
        "subject": "Invoice #2291",
        "sender": "Financeiro <financeiro@acme.com.br>",
        "content": "Please review the attached invoice",
        "category": category,
        "suggested_response": "Obrigado, vamos analisar a fatura e retornamos em breve.",
        "confidence_score": 93.0,
        "created_at": "2025-03-01T10:05:00Z"
    })
}

/// Enveloped list body, the shape current deployments answer with.
pub fn email_list_envelope(rows: Vec<Value>) -> Value {
    let count = rows.len();
    json!({
        "success": true,
        "emails": rows,
        "count": count,
        "user_ip": "127.0.0.1"
    })
}

pub fn backend_status_online() -> Value {
    json!({
        "status": "online",
        "message": "Backend funcionando",
        "version": "1.0.4",
        "timestamp": "2025-03-01T10:00:00",
        "database": {"status": "connected", "engine": "sqlite3"},
        "server_info": {"environment": "development", "port": "8000"},
        "debug_mode": true
    })
}

pub fn api_usage(minute_percent: f64, queue_length: u32) -> Value {
    json!({
        "gemini_api": {
            "minute_usage": 3,
            "minute_limit": 15,
            "minute_percent": minute_percent,
            "day_usage": 42,
            "day_limit": 1500,
            "day_percent": 2.8,
            "total_today": 42
        },
        "job_queue": {
            "queue_length": queue_length,
            "active_job": null,
            "estimated_wait": 0,
            "queued_jobs": [],
            "processing_count": 0
        },
        "timestamp": "2025-03-01T10:00:00"
    })
}
