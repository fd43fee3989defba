pub mod email;
pub mod job;
pub mod submission;
pub mod telemetry;
