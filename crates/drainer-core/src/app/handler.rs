//! Handler slots - what runs for each message and for each batch.
//!
//! # 学習ポイント
//! - `Handler<C: ?Sized>` で item / list の二種類の slot を一つの enum で表現
//! - closure を `ItemFn` / `ListFn` で包んで trait object にする (type erasure)
//!
//! A slot is either a local callback or the identifier of a remote function.
//! The engine matches on the tag at dispatch time; nothing inspects the value
//! itself to guess its kind.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Message;
use crate::error::HandlerError;
use crate::ports::RemoteIdentifier;

/// Runs once per fetched message.
#[async_trait]
pub trait ItemCallback: Send + Sync {
    async fn handle(&self, message: Message) -> Result<serde_json::Value, HandlerError>;
}

/// Runs once per batch with the survivors, in fetch order.
#[async_trait]
pub trait ListCallback: Send + Sync {
    async fn handle(&self, survivors: Vec<Message>) -> Result<(), HandlerError>;
}

/// A handler slot: local callback or remote identifier.
pub enum Handler<C: ?Sized> {
    Local(Arc<C>),
    Remote(RemoteIdentifier),
}

pub type ItemHandler = Handler<dyn ItemCallback>;
pub type ListHandler = Handler<dyn ListCallback>;

impl<C: ?Sized> Handler<C> {
    pub fn remote(identifier: impl Into<RemoteIdentifier>) -> Self {
        Handler::Remote(identifier.into())
    }

    pub fn remote_identifier(&self) -> Option<&RemoteIdentifier> {
        match self {
            Handler::Local(_) => None,
            Handler::Remote(id) => Some(id),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Handler::Remote(_))
    }
}

impl<C: ?Sized> Clone for Handler<C> {
    fn clone(&self) -> Self {
        match self {
            Handler::Local(c) => Handler::Local(Arc::clone(c)),
            Handler::Remote(id) => Handler::Remote(id.clone()),
        }
    }
}

impl<C: ?Sized> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Local(_) => f.write_str("Local(..)"),
            Handler::Remote(id) => f.debug_tuple("Remote").field(id).finish(),
        }
    }
}

impl Handler<dyn ItemCallback> {
    pub fn local(callback: impl ItemCallback + 'static) -> Self {
        Handler::Local(Arc::new(callback))
    }

    /// Wrap an async closure taking the message.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, HandlerError>> + Send + 'static,
    {
        Self::local(ItemFn(f))
    }

    /// Succeeds with `null` for every message.
    pub fn noop() -> Self {
        Self::local(NoopItem)
    }
}

impl Handler<dyn ListCallback> {
    pub fn local(callback: impl ListCallback + 'static) -> Self {
        Handler::Local(Arc::new(callback))
    }

    /// Wrap an async closure taking the survivors.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self::local(ListFn(f))
    }

    pub fn noop() -> Self {
        Self::local(NoopList)
    }
}

impl Default for Handler<dyn ItemCallback> {
    fn default() -> Self {
        Self::noop()
    }
}

impl Default for Handler<dyn ListCallback> {
    fn default() -> Self {
        Self::noop()
    }
}

struct ItemFn<F>(F);

#[async_trait]
impl<F, Fut> ItemCallback for ItemFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<serde_json::Value, HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: Message) -> Result<serde_json::Value, HandlerError> {
        (self.0)(message).await
    }
}

struct ListFn<F>(F);

#[async_trait]
impl<F, Fut> ListCallback for ListFn<F>
where
    F: Fn(Vec<Message>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, survivors: Vec<Message>) -> Result<(), HandlerError> {
        (self.0)(survivors).await
    }
}

struct NoopItem;

#[async_trait]
impl ItemCallback for NoopItem {
    async fn handle(&self, _message: Message) -> Result<serde_json::Value, HandlerError> {
        Ok(serde_json::Value::Null)
    }
}

struct NoopList;

#[async_trait]
impl ListCallback for NoopList {
    async fn handle(&self, _survivors: Vec<Message>) -> Result<(), HandlerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AckHandle;

    fn msg() -> Message {
        Message::new(serde_json::json!({"n": 7}), AckHandle::new("h"))
    }

    #[tokio::test]
    async fn default_handlers_succeed_with_nothing() {
        let Handler::Local(item) = ItemHandler::default() else {
            panic!("default item handler must be local");
        };
        assert_eq!(item.handle(msg()).await.unwrap(), serde_json::Value::Null);

        let Handler::Local(list) = ListHandler::default() else {
            panic!("default list handler must be local");
        };
        list.handle(vec![msg()]).await.unwrap();
    }

    #[tokio::test]
    async fn closure_handler_sees_payload() {
        let h = ItemHandler::from_fn(|m: Message| async move { Ok::<_, HandlerError>(m.payload()["n"].clone()) });
        let Handler::Local(cb) = h else { unreachable!() };
        assert_eq!(cb.handle(msg()).await.unwrap(), serde_json::json!(7));
    }

    #[test]
    fn remote_slot_keeps_identifier() {
        let h = ListHandler::remote("arn:aws:lambda:eu-west-1:1:function:sink");
        assert!(h.is_remote());
        assert_eq!(
            h.remote_identifier().map(RemoteIdentifier::as_str),
            Some("arn:aws:lambda:eu-west-1:1:function:sink")
        );
        assert_eq!(format!("{:?}", ItemHandler::noop()), "Local(..)");
    }
}
