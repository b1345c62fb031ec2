//! Ports - the collaborators the engine talks to.
//!
//! Each trait hides an external system (queue transport, remote function
//! runtime, the caller's stop condition). In-memory implementations live in
//! `impls`.

pub mod invocation;
pub mod predicate;
pub mod queue_client;

pub use self::invocation::{InvocationError, InvocationTarget, RemoteIdentifier};
pub use self::predicate::{ContinuationPredicate, PredicateError};
pub use self::queue_client::{QueueClient, QueueEndpoint, QueueError};
