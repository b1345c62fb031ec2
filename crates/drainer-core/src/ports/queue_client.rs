//! QueueClient port - the queue transport the engine drains.
//!
//! Implementations own transport concerns (auth, retry/backoff, wire format).
//! The engine only fetches batches and deletes what succeeded.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AckHandle, Message};

/// Identifier of the queue to drain (for SQS-like transports, the queue URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueEndpoint(String);

impl QueueEndpoint {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("queue transport error: {0}")]
    Transport(String),

    #[error("unknown queue endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("unknown or expired ack handle: {0}")]
    UnknownHandle(String),
}

#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Fetch up to `max_items` messages (1..=10).
    ///
    /// `Ok(None)` and `Ok(Some(vec![]))` both mean "nothing to drain".
    async fn fetch_batch(
        &self,
        endpoint: &QueueEndpoint,
        max_items: usize,
    ) -> Result<Option<Vec<Message>>, QueueError>;

    /// Delete one message by the handle it was fetched with.
    async fn acknowledge(
        &self,
        endpoint: &QueueEndpoint,
        ack_handle: &AckHandle,
    ) -> Result<(), QueueError>;
}
