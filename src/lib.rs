//! Email triage client
//!
//! Submits emails to the triage backend, follows the classification job
//! until the result is final, and reads back the classified history and the
//! backend's queue and quota telemetry.

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
