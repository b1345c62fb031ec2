use thiserror::Error;

use crate::ports::{InvocationError, QueueError};

/// Errors that end a run (or prevent one from starting).
///
/// Per-item failures never show up here; they are counted in `Metrics`.
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("invalid configuration: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("fetch failed: {0}")]
    Fetch(#[source] QueueError),
}

impl DrainError {
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of an item or list handler.
///
/// Captured into a `Failed` outcome; never propagated out of `run`.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("remote handler `{0}` registered but no invocation target configured")]
    NoInvocationTarget(String),
}

impl HandlerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}
