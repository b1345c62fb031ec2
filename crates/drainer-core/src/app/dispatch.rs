//! Dispatcher - resolves a handler slot and runs it.

use std::sync::Arc;

use tracing::{debug, warn};

use super::handler::{Handler, ItemHandler, ListHandler};
use crate::domain::{ItemOutcome, Message};
use crate::error::HandlerError;
use crate::ports::{InvocationTarget, RemoteIdentifier};

pub(crate) struct Dispatcher {
    invoker: Option<Arc<dyn InvocationTarget>>,
}

impl Dispatcher {
    pub(crate) fn new(invoker: Option<Arc<dyn InvocationTarget>>) -> Self {
        Self { invoker }
    }

    pub(crate) fn has_invoker(&self) -> bool {
        self.invoker.is_some()
    }

    /// Run the item handler on one message. Never fails: errors become `Failed`.
    pub(crate) async fn dispatch_item(&self, handler: &ItemHandler, message: Message) -> ItemOutcome {
        let result = match handler {
            Handler::Local(cb) => cb.handle(message.clone()).await,
            Handler::Remote(id) => self
                .submit(id, message.payload())
                .await
                .map(|()| serde_json::Value::Null),
        };

        match result {
            Ok(value) => ItemOutcome::succeeded(message, value),
            Err(err) => {
                warn!(ack_handle = %message.ack_handle(), error = %err, "item handler failed");
                ItemOutcome::failed(message, err)
            }
        }
    }

    /// Run the list handler once over the survivors of a batch.
    ///
    /// A remote list handler receives the survivors' payloads as a JSON array.
    pub(crate) async fn dispatch_list(
        &self,
        handler: &ListHandler,
        survivors: Vec<Message>,
    ) -> Result<(), HandlerError> {
        match handler {
            Handler::Local(cb) => cb.handle(survivors).await,
            Handler::Remote(id) => {
                let payloads = serde_json::Value::Array(
                    survivors.iter().map(|m| m.payload().clone()).collect(),
                );
                self.submit(id, &payloads).await
            }
        }
    }

    async fn submit(
        &self,
        identifier: &RemoteIdentifier,
        payload: &serde_json::Value,
    ) -> Result<(), HandlerError> {
        let invoker = self
            .invoker
            .as_ref()
            .ok_or_else(|| HandlerError::NoInvocationTarget(identifier.to_string()))?;

        debug!(%identifier, "submitting to remote handler");
        invoker.invoke(identifier, payload).await?;
        Ok(())
    }
}
