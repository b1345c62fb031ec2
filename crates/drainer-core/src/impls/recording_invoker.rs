//! RecordingInvocationTarget - accepts submissions and remembers them.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{InvocationError, InvocationTarget, RemoteIdentifier};

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub identifier: RemoteIdentifier,
    pub payload: serde_json::Value,
}

/// Stand-in for a remote function runtime.
///
/// Every accepted submission is recorded; identifiers marked with `reject`
/// are refused.
#[derive(Debug, Default)]
pub struct RecordingInvocationTarget {
    submissions: Mutex<Vec<Submission>>,
    rejected: HashSet<RemoteIdentifier>,
}

impl RecordingInvocationTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every submission to `identifier`.
    pub fn reject(mut self, identifier: impl Into<RemoteIdentifier>) -> Self {
        self.rejected.insert(identifier.into());
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .map(|s| s.to_vec())
            .unwrap_or_default()
    }

    pub fn count_for(&self, identifier: &str) -> usize {
        self.submissions()
            .iter()
            .filter(|s| s.identifier.as_str() == identifier)
            .count()
    }
}

#[async_trait]
impl InvocationTarget for RecordingInvocationTarget {
    async fn invoke(
        &self,
        identifier: &RemoteIdentifier,
        payload: &serde_json::Value,
    ) -> Result<(), InvocationError> {
        if self.rejected.contains(identifier) {
            return Err(InvocationError::Rejected {
                identifier: identifier.to_string(),
                reason: "submission refused".to_string(),
            });
        }

        debug!(%identifier, "submission accepted");
        self.submissions
            .lock()
            .map_err(|e| InvocationError::Transport(e.to_string()))?
            .push(Submission {
                identifier: identifier.clone(),
                payload: payload.clone(),
            });
        Ok(())
    }
}
