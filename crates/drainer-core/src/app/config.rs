//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::DrainError;
use crate::ports::QueueEndpoint;

/// Largest batch the queue transport hands out in one fetch.
pub const MAX_BATCH_SIZE: usize = 10;
pub const MIN_BATCH_SIZE: usize = 1;

/// Messages per fetch, always within `MIN_BATCH_SIZE..=MAX_BATCH_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "usize", into = "usize")]
pub struct BatchSize(usize);

impl BatchSize {
    /// Out-of-range values are clamped to the nearest bound, not rejected.
    pub fn clamped(n: usize) -> Self {
        Self(n.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(MAX_BATCH_SIZE)
    }
}

impl From<usize> for BatchSize {
    fn from(n: usize) -> Self {
        Self::clamped(n)
    }
}

impl From<BatchSize> for usize {
    fn from(b: BatchSize) -> Self {
        b.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Queue to drain (required, non-empty).
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl EngineConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            batch_size: None,
        }
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = Some(n);
        self
    }

    pub fn validate(&self) -> Result<(), DrainError> {
        if self.endpoint.trim().is_empty() {
            return Err(DrainError::configuration(
                "endpoint",
                "missing queue endpoint identifier",
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> QueueEndpoint {
        QueueEndpoint::new(self.endpoint.trim())
    }

    pub fn batch_size(&self) -> BatchSize {
        self.batch_size.map(BatchSize::clamped).unwrap_or_default()
    }
}
