//! DrainEngine - fetch → dispatch → list → acknowledge, until told to stop.
//!
//! # フロー
//! 1. ContinuationPredicate::should_stop() (stop or error → quit)
//! 2. QueueClient::fetch_batch() (empty or absent → quit)
//! 3. item handler on every message, concurrently
//! 4. list handler once, with the survivors in fetch order
//! 5. QueueClient::acknowledge() for each survivor
//!
//! # 再配送
//! Failed items are never acknowledged, and neither is a batch whose list
//! handler failed. They stay on the queue and come back through the
//! transport's own redelivery (visibility timeout); the engine has no retry of
//! its own.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::builder::EngineBuilder;
use super::config::{BatchSize, EngineConfig};
use super::dispatch::Dispatcher;
use super::handler::{ItemHandler, ListHandler};
use crate::domain::outcome::survivors;
use crate::domain::{AckFailure, AckHandle, Message, Metrics, MetricsRecorder, RunReport, StopReason};
use crate::error::{DrainError, HandlerError};
use crate::ports::{
    ContinuationPredicate, InvocationTarget, QueueClient, QueueEndpoint, RemoteIdentifier,
};

pub struct DrainEngine {
    endpoint: QueueEndpoint,
    batch_size: BatchSize,
    queue: Arc<dyn QueueClient>,
    dispatcher: Dispatcher,
    item_handler: ItemHandler,
    list_handler: ListHandler,
    metrics: MetricsRecorder,
}

/// What one iteration left behind besides the counters.
#[derive(Debug, Default)]
struct BatchSummary {
    ack_failures: Vec<AckFailure>,
    list_handler_failed: bool,
}

impl DrainEngine {
    /// Build an engine with default handlers.
    ///
    /// Fails with `DrainError::Configuration` when the endpoint is missing.
    pub fn new(config: EngineConfig, queue: Arc<dyn QueueClient>) -> Result<Self, DrainError> {
        config.validate()?;
        Ok(Self {
            endpoint: config.endpoint(),
            batch_size: config.batch_size(),
            queue,
            dispatcher: Dispatcher::new(None),
            item_handler: ItemHandler::default(),
            list_handler: ListHandler::default(),
            metrics: MetricsRecorder::new(),
        })
    }

    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Remote handler slots submit through this target.
    pub fn with_invocation_target(mut self, target: Arc<dyn InvocationTarget>) -> Self {
        self.dispatcher = Dispatcher::new(Some(target));
        self
    }

    /// Replace the item handler (last registration wins).
    pub fn set_item_handler(&mut self, handler: ItemHandler) -> &mut Self {
        self.item_handler = handler;
        self
    }

    /// Replace the list handler (last registration wins).
    pub fn set_list_handler(&mut self, handler: ListHandler) -> &mut Self {
        self.list_handler = handler;
        self
    }

    /// Register a local async closure as the item handler.
    pub fn set_item_callback<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, HandlerError>> + Send + 'static,
    {
        self.set_item_handler(ItemHandler::from_fn(f))
    }

    /// Submit every item to a remote function instead.
    pub fn set_item_remote(&mut self, identifier: impl Into<RemoteIdentifier>) -> &mut Self {
        self.set_item_handler(ItemHandler::remote(identifier))
    }

    pub fn set_list_callback<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Vec<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.set_list_handler(ListHandler::from_fn(f))
    }

    pub fn set_list_remote(&mut self, identifier: impl Into<RemoteIdentifier>) -> &mut Self {
        self.set_list_handler(ListHandler::remote(identifier))
    }

    /// Clamped to 1..=10.
    pub fn set_batch_size(&mut self, n: usize) -> &mut Self {
        self.batch_size = BatchSize::clamped(n);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    pub fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    pub fn item_handler(&self) -> &ItemHandler {
        &self.item_handler
    }

    pub fn list_handler(&self) -> &ListHandler {
        &self.list_handler
    }

    pub fn has_invocation_target(&self) -> bool {
        self.dispatcher.has_invoker()
    }

    /// Counters accumulate across runs until `reset_metrics`.
    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Drain until the predicate says stop (or fails) or a fetch comes back empty.
    ///
    /// All three endings yield the same value: the metrics snapshot. Use
    /// `run_with_report` to tell them apart.
    pub async fn run<P>(&self, predicate: &P) -> Result<Metrics, DrainError>
    where
        P: ContinuationPredicate + ?Sized,
    {
        self.run_with_report(predicate).await.map(|r| r.metrics)
    }

    /// Same loop as `run`, keeping the stop reason and the deletion failures.
    ///
    /// Only a fetch failure is returned as an error.
    pub async fn run_with_report<P>(&self, predicate: &P) -> Result<RunReport, DrainError>
    where
        P: ContinuationPredicate + ?Sized,
    {
        info!(endpoint = %self.endpoint, batch_size = self.batch_size.get(), "drain run starting");

        let mut ack_failures = Vec::new();
        let mut list_handler_failures = 0u64;

        let stop_reason = loop {
            match predicate.should_stop().await {
                Ok(true) => break StopReason::PredicateStop,
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "continuation predicate failed, stopping");
                    break StopReason::PredicateFailed(e.to_string());
                }
            }

            let batch = self
                .queue
                .fetch_batch(&self.endpoint, self.batch_size.get())
                .await
                .map_err(DrainError::Fetch)?;
            self.metrics.record_iteration();

            let messages = match batch {
                Some(messages) if !messages.is_empty() => messages,
                _ => break StopReason::Drained,
            };

            let summary = self.process_batch(messages).await;
            ack_failures.extend(summary.ack_failures);
            if summary.list_handler_failed {
                list_handler_failures += 1;
            }
        };

        let metrics = self.metrics.snapshot();
        info!(
            ?stop_reason,
            iterations = metrics.iterations,
            processed = metrics.processed,
            failed = metrics.failed,
            "drain run finished"
        );

        Ok(RunReport {
            metrics,
            stop_reason,
            ack_failures,
            list_handler_failures,
        })
    }

    async fn process_batch(&self, messages: Vec<Message>) -> BatchSummary {
        debug!(size = messages.len(), "processing batch");

        // join_all keeps input order, so survivors stay in fetch order.
        let outcomes = join_all(messages.into_iter().map(|message| async move {
            let outcome = self.dispatcher.dispatch_item(&self.item_handler, message).await;
            self.metrics.record_item(outcome.is_success());
            outcome
        }))
        .await;

        let survivors = survivors(&outcomes);
        let handles: Vec<AckHandle> = survivors.iter().map(|m| m.ack_handle().clone()).collect();

        let mut summary = BatchSummary::default();
        if let Err(e) = self
            .dispatcher
            .dispatch_list(&self.list_handler, survivors)
            .await
        {
            // survivors stay in flight and come back with the transport's redelivery
            warn!(error = %e, survivors = handles.len(), "list handler failed, batch left unacknowledged");
            summary.list_handler_failed = true;
            return summary;
        }

        summary.ack_failures = self.acknowledge_all(&handles).await;
        debug!(
            fetched = outcomes.len(),
            acknowledged = handles.len() - summary.ack_failures.len(),
            "batch done"
        );
        summary
    }

    async fn acknowledge_all(&self, handles: &[AckHandle]) -> Vec<AckFailure> {
        let results = join_all(handles.iter().map(|handle| async move {
            self.queue
                .acknowledge(&self.endpoint, handle)
                .await
                .map_err(|e| AckFailure {
                    ack_handle: handle.clone(),
                    error: e.to_string(),
                })
        }))
        .await;

        results
            .into_iter()
            .filter_map(Result::err)
            .inspect(|f| warn!(ack_handle = %f.ack_handle, error = %f.error, "acknowledge failed"))
            .collect()
    }
}

impl std::fmt::Debug for DrainEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainEngine")
            .field("endpoint", &self.endpoint)
            .field("batch_size", &self.batch_size)
            .field("item_handler", &self.item_handler)
            .field("list_handler", &self.list_handler)
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryQueueClient;
    use crate::ports::PredicateError;

    fn queue() -> Arc<InMemoryQueueClient> {
        Arc::new(InMemoryQueueClient::new("q"))
    }

    #[test]
    fn construction_requires_endpoint() {
        let err = DrainEngine::new(EngineConfig::new(""), queue()).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn batch_size_setter_clamps() {
        let mut engine = DrainEngine::new(EngineConfig::new("q"), queue()).unwrap();
        assert_eq!(engine.batch_size(), 10);
        assert_eq!(engine.set_batch_size(0).batch_size(), 1);
        assert_eq!(engine.set_batch_size(99).batch_size(), 10);
        assert_eq!(engine.set_batch_size(4).batch_size(), 4);
    }

    #[test]
    fn last_registration_wins() {
        let mut engine = DrainEngine::new(EngineConfig::new("q"), queue()).unwrap();
        engine
            .set_item_handler(ItemHandler::remote("first"))
            .set_item_handler(ItemHandler::remote("second"));
        assert_eq!(
            engine.item_handler().remote_identifier().unwrap().as_str(),
            "second"
        );
        engine.set_item_handler(ItemHandler::noop());
        assert!(!engine.item_handler().is_remote());
    }

    #[tokio::test]
    async fn convenience_setters_fill_the_slots() {
        let q = queue();
        q.push(serde_json::json!({"n": 1})).await;
        let mut engine = DrainEngine::new(EngineConfig::new("q"), q.clone()).unwrap();

        engine.set_item_remote("worker").set_list_remote("sink");
        assert_eq!(engine.item_handler().remote_identifier().unwrap().as_str(), "worker");
        assert_eq!(engine.list_handler().remote_identifier().unwrap().as_str(), "sink");

        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        engine
            .set_item_callback(|m: Message| async move {
                Ok::<_, HandlerError>(m.payload()["n"].clone())
            })
            .set_list_callback(move |survivors: Vec<Message>| {
                counter.fetch_add(survivors.len(), std::sync::atomic::Ordering::SeqCst);
                async { Ok::<(), HandlerError>(()) }
            });
        assert!(!engine.item_handler().is_remote());
        assert!(!engine.list_handler().is_remote());

        let metrics = engine.run(&crate::app::Never).await.unwrap();
        assert_eq!(metrics.processed, 1);
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(q.acknowledged().await.len(), 1);
    }

    #[tokio::test]
    async fn stop_before_first_fetch_leaves_metrics_untouched() {
        let q = queue();
        q.push(serde_json::json!(1)).await;
        let engine = DrainEngine::new(EngineConfig::new("q"), q.clone()).unwrap();

        let report = engine
            .run_with_report(&|| async { Ok::<_, PredicateError>(true) })
            .await
            .unwrap();
        assert_eq!(report.metrics, Metrics::default());
        assert_eq!(report.stop_reason, StopReason::PredicateStop);
        assert_eq!(q.fetch_count().await, 0);
    }
}
