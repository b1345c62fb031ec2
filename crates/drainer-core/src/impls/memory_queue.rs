//! In-memory queue client.
//!
//! Behaves like a visibility-timeout queue: fetched messages move to an
//! in-flight set and disappear only when acknowledged. `expire_in_flight()`
//! plays the role of the timeout and makes unacknowledged messages visible
//! again.
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で状態をまとめて保護（ロック跨ぎの await はしない）
//! - ready / in_flight の二段構成で at-least-once を再現

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{AckHandle, Message};
use crate::ports::{QueueClient, QueueEndpoint, QueueError};

struct QueueState {
    /// Visible messages, oldest first.
    ready: VecDeque<Message>,

    /// Fetched but not yet acknowledged, in fetch order.
    in_flight: Vec<Message>,

    /// Every acknowledged handle, in acknowledgment order.
    acknowledged: Vec<AckHandle>,

    fetches: u64,
    next_id: u64,
}

pub struct InMemoryQueueClient {
    endpoint: QueueEndpoint,
    state: Mutex<QueueState>,
}

impl InMemoryQueueClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: QueueEndpoint::new(endpoint),
            state: Mutex::new(QueueState {
                ready: VecDeque::new(),
                in_flight: Vec::new(),
                acknowledged: Vec::new(),
                fetches: 0,
                next_id: 1,
            }),
        }
    }

    pub fn endpoint(&self) -> &QueueEndpoint {
        &self.endpoint
    }

    /// Enqueue a payload under a generated handle (`rh-1`, `rh-2`, ...).
    pub async fn push(&self, payload: serde_json::Value) -> AckHandle {
        let mut st = self.state.lock().await;
        let n = st.next_id;
        st.next_id += 1;

        let handle = AckHandle::new(format!("rh-{n}"));
        let message = Message::new(payload, handle.clone()).with_message_id(format!("m-{n}"));
        st.ready.push_back(message);
        handle
    }

    /// Enqueue a message as-is (keeps its own handle).
    pub async fn push_message(&self, message: Message) {
        self.state.lock().await.ready.push_back(message);
    }

    /// Make every unacknowledged message visible again, ahead of newer ones.
    ///
    /// Returns how many messages were redelivered.
    pub async fn expire_in_flight(&self) -> usize {
        let mut st = self.state.lock().await;
        let expired: Vec<Message> = st.in_flight.drain(..).collect();
        let n = expired.len();
        for message in expired.into_iter().rev() {
            st.ready.push_front(message);
        }
        n
    }

    pub async fn acknowledged(&self) -> Vec<AckHandle> {
        self.state.lock().await.acknowledged.clone()
    }

    pub async fn ready_len(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    pub async fn fetch_count(&self) -> u64 {
        self.state.lock().await.fetches
    }

    fn check_endpoint(&self, endpoint: &QueueEndpoint) -> Result<(), QueueError> {
        if endpoint != &self.endpoint {
            return Err(QueueError::UnknownEndpoint(endpoint.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    /// An empty queue answers `None`, like a receive response without a
    /// message list.
    async fn fetch_batch(
        &self,
        endpoint: &QueueEndpoint,
        max_items: usize,
    ) -> Result<Option<Vec<Message>>, QueueError> {
        self.check_endpoint(endpoint)?;

        let mut st = self.state.lock().await;
        st.fetches += 1;

        let n = max_items.min(st.ready.len());
        if n == 0 {
            return Ok(None);
        }

        let batch: Vec<Message> = st.ready.drain(..n).collect();
        st.in_flight.extend(batch.iter().cloned());
        Ok(Some(batch))
    }

    async fn acknowledge(
        &self,
        endpoint: &QueueEndpoint,
        ack_handle: &AckHandle,
    ) -> Result<(), QueueError> {
        self.check_endpoint(endpoint)?;

        let mut st = self.state.lock().await;
        let pos = st
            .in_flight
            .iter()
            .position(|m| m.ack_handle() == ack_handle)
            .ok_or_else(|| QueueError::UnknownHandle(ack_handle.to_string()))?;
        st.in_flight.remove(pos);
        st.acknowledged.push(ack_handle.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_respects_max_items() {
        let q = InMemoryQueueClient::new("q");
        for i in 0..5 {
            q.push(json!(i)).await;
        }

        let batch = q.fetch_batch(q.endpoint(), 3).await.unwrap().unwrap();
        let payloads: Vec<_> = batch.iter().map(|m| m.payload().clone()).collect();
        assert_eq!(payloads, vec![json!(0), json!(1), json!(2)]);
        assert_eq!(q.ready_len().await, 2);
        assert_eq!(q.in_flight_len().await, 3);
    }

    #[tokio::test]
    async fn empty_queue_answers_none() {
        let q = InMemoryQueueClient::new("q");
        assert!(q.fetch_batch(q.endpoint(), 10).await.unwrap().is_none());
        assert_eq!(q.fetch_count().await, 1);
    }

    #[tokio::test]
    async fn acknowledge_removes_in_flight() {
        let q = InMemoryQueueClient::new("q");
        let h = q.push(json!("x")).await;
        q.fetch_batch(q.endpoint(), 1).await.unwrap();

        q.acknowledge(q.endpoint(), &h).await.unwrap();
        assert_eq!(q.in_flight_len().await, 0);
        assert_eq!(q.acknowledged().await, vec![h.clone()]);

        // second delete of the same handle is rejected
        let err = q.acknowledge(q.endpoint(), &h).await.unwrap_err();
        assert!(matches!(err, QueueError::UnknownHandle(_)));
    }

    #[tokio::test]
    async fn expired_messages_are_redelivered_first() {
        let q = InMemoryQueueClient::new("q");
        let a = q.push(json!("a")).await;
        let b = q.push(json!("b")).await;
        q.push(json!("c")).await;

        q.fetch_batch(q.endpoint(), 2).await.unwrap();
        assert_eq!(q.expire_in_flight().await, 2);

        let batch = q.fetch_batch(q.endpoint(), 10).await.unwrap().unwrap();
        let handles: Vec<_> = batch.iter().map(|m| m.ack_handle().clone()).collect();
        assert_eq!(handles[..2], [a, b]);
        assert_eq!(handles.len(), 3);
    }

    #[tokio::test]
    async fn wrong_endpoint_is_rejected() {
        let q = InMemoryQueueClient::new("q");
        let err = q
            .fetch_batch(&QueueEndpoint::new("other"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::UnknownEndpoint(e) if e == "other"));
    }
}
