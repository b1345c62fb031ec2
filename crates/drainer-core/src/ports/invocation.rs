//! InvocationTarget port - fire-and-forget remote functions.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name (or ARN) of a remote function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteIdentifier(String);

impl RemoteIdentifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RemoteIdentifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RemoteIdentifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    #[error("submission to `{identifier}` rejected: {reason}")]
    Rejected { identifier: String, reason: String },

    #[error("invocation transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait InvocationTarget: Send + Sync {
    /// Submit `payload` to the function named `identifier`.
    ///
    /// Resolves once the submission is accepted; does not wait for the remote
    /// function to run.
    async fn invoke(
        &self,
        identifier: &RemoteIdentifier,
        payload: &serde_json::Value,
    ) -> Result<(), InvocationError>;
}
