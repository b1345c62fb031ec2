//! drainer-core
//!
//! Batch queue-draining engine: fetch a bounded batch, run a handler per
//! message, run a list handler over the survivors, delete only what succeeded,
//! repeat while the caller's continuation predicate allows it.
//!
//! # Modules
//! - **domain**: messages, outcomes, counters, run reports
//! - **ports**: traits for the queue transport, remote invocation and the stop condition
//! - **app**: the engine, its builder, handler slots, stop predicates
//! - **impls**: in-memory port implementations (tests, local runs)
//! - **error**: error types
//!
//! # 配送保証
//! - 失敗したメッセージは削除しない（at-least-once）
//! - list handler が失敗したバッチも削除しない
//! - 再配送はキュー側の visibility timeout に任せる。ここにリトライはない

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use app::{DrainEngine, EngineBuilder, EngineConfig, Handler, ItemHandler, ListHandler};
pub use domain::{AckHandle, Message, Metrics, RunReport, StopReason};
pub use error::{DrainError, HandlerError};
