//! What a finished run tells its caller.

use serde::Serialize;

use super::message::AckHandle;
use super::metrics::Metrics;

/// Why a run ended.
///
/// `DrainEngine::run` folds all of these into the plain metrics value;
/// `run_with_report` keeps them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// The continuation predicate asked to stop.
    PredicateStop,

    /// The continuation predicate itself failed.
    PredicateFailed(String),

    /// A fetch returned no messages.
    Drained,
}

/// A succeeded message whose deletion was rejected by the transport.
///
/// The message stays on the queue and will be redelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AckFailure {
    pub ack_handle: AckHandle,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub metrics: Metrics,
    pub stop_reason: StopReason,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ack_failures: Vec<AckFailure>,
    pub list_handler_failures: u64,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.ack_failures.is_empty()
            && self.list_handler_failures == 0
            && !matches!(self.stop_reason, StopReason::PredicateFailed(_))
    }
}
