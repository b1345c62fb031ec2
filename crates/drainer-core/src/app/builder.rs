//! EngineBuilder - wiring and fail-fast validation.
//!
//! # Fail-fast 設計
//! Everything that can be checked without I/O is checked in `build()`:
//! - the queue endpoint is present
//! - a queue client was supplied
//! - a remote handler slot has an invocation target to submit through

use std::sync::Arc;

use super::config::EngineConfig;
use super::engine::DrainEngine;
use super::handler::{Handler, ItemHandler, ListHandler};
use crate::error::DrainError;
use crate::ports::{InvocationTarget, QueueClient};

/// # Example
/// ```ignore
/// let engine = DrainEngine::builder(EngineConfig::new(queue_url))
///     .queue(client)
///     .invocation_target(lambda)
///     .item_handler(ItemHandler::remote("worker-fn"))
///     .build()?;
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    queue: Option<Arc<dyn QueueClient>>,
    invoker: Option<Arc<dyn InvocationTarget>>,
    item_handler: ItemHandler,
    list_handler: ListHandler,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            queue: None,
            invoker: None,
            item_handler: ItemHandler::default(),
            list_handler: ListHandler::default(),
        }
    }

    pub fn queue(mut self, queue: Arc<dyn QueueClient>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn invocation_target(mut self, target: Arc<dyn InvocationTarget>) -> Self {
        self.invoker = Some(target);
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = Some(n);
        self
    }

    pub fn item_handler(mut self, handler: ItemHandler) -> Self {
        self.item_handler = handler;
        self
    }

    pub fn list_handler(mut self, handler: ListHandler) -> Self {
        self.list_handler = handler;
        self
    }

    pub fn build(self) -> Result<DrainEngine, DrainError> {
        self.config.validate()?;

        let queue = self
            .queue
            .ok_or_else(|| DrainError::configuration("queue", "no queue client supplied"))?;

        if self.invoker.is_none() {
            for (slot, handler) in [
                ("item_handler", remote_name(&self.item_handler)),
                ("list_handler", remote_name(&self.list_handler)),
            ] {
                if let Some(id) = handler {
                    return Err(DrainError::configuration(
                        slot,
                        format!("remote handler `{id}` needs an invocation target"),
                    ));
                }
            }
        }

        let mut engine = DrainEngine::new(self.config, queue)?;
        if let Some(invoker) = self.invoker {
            engine = engine.with_invocation_target(invoker);
        }
        engine
            .set_item_handler(self.item_handler)
            .set_list_handler(self.list_handler);
        Ok(engine)
    }
}

fn remote_name<C: ?Sized>(handler: &Handler<C>) -> Option<String> {
    handler.remote_identifier().map(ToString::to_string)
}
