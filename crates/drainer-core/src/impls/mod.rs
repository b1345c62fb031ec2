//! Impls - in-memory implementations of the ports.
//!
//! Used by tests and by the CLI's local mode. Production transports (SQS,
//! Lambda, ...) implement the same traits in their own crates.

pub mod memory_queue;
pub mod recording_invoker;

pub use self::memory_queue::InMemoryQueueClient;
pub use self::recording_invoker::{RecordingInvocationTarget, Submission};
