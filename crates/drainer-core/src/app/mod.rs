//! App - the drain engine and its configuration surface.
//!
//! # Main components
//! - **EngineBuilder**: wiring + fail-fast validation
//! - **DrainEngine**: the fetch/dispatch/list/acknowledge loop
//! - **Handler**: item and list handler slots (local callback or remote identifier)
//! - **stop**: ready-made continuation predicates

pub mod builder;
pub mod config;
mod dispatch;
pub mod engine;
pub mod handler;
pub mod stop;

pub use self::builder::EngineBuilder;
pub use self::config::{BatchSize, EngineConfig, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
pub use self::engine::DrainEngine;
pub use self::handler::{Handler, ItemCallback, ItemHandler, ListCallback, ListHandler};
pub use self::stop::{AnyOf, Deadline, Never, StopAfter};
