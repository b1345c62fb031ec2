//! Per-item dispatch results.

use super::message::Message;
use crate::error::HandlerError;

/// Result of running the item handler on one message.
#[derive(Debug)]
pub enum ItemResult {
    /// Handler succeeded; carries whatever the handler produced.
    Succeeded(serde_json::Value),

    /// Handler failed (or rejected the remote submission).
    Failed(HandlerError),
}

/// One outcome per dispatched message, paired with the message itself.
#[derive(Debug)]
pub struct ItemOutcome {
    pub message: Message,
    pub result: ItemResult,
}

impl ItemOutcome {
    pub fn succeeded(message: Message, value: serde_json::Value) -> Self {
        Self {
            message,
            result: ItemResult::Succeeded(value),
        }
    }

    pub fn failed(message: Message, error: HandlerError) -> Self {
        Self {
            message,
            result: ItemResult::Failed(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, ItemResult::Succeeded(_))
    }

    pub fn error(&self) -> Option<&HandlerError> {
        match &self.result {
            ItemResult::Succeeded(_) => None,
            ItemResult::Failed(e) => Some(e),
        }
    }
}

/// Split outcomes into survivors, keeping fetch order.
pub fn survivors(outcomes: &[ItemOutcome]) -> Vec<Message> {
    outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| o.message.clone())
        .collect()
}
