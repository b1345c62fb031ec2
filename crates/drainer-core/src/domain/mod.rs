//! Domain model (messages, outcomes, counters, run reports).

pub mod message;
pub mod metrics;
pub mod outcome;
pub mod report;

pub use message::{AckHandle, Message};
pub use metrics::{Metrics, MetricsRecorder};
pub use outcome::{ItemOutcome, ItemResult};
pub use report::{AckFailure, RunReport, StopReason};
