pub mod attachment;
pub mod backend;
pub mod format;
pub mod history;
pub mod notice;
pub mod polling;
pub mod progress;
pub mod telemetry;
pub mod validation;
