//! ContinuationPredicate port - asked once per iteration, before fetching.

use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("continuation check failed: {0}")]
pub struct PredicateError(pub String);

impl PredicateError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Decides whether the engine should stop before the next fetch.
///
/// `Ok(true)` means stop. An `Err` stops the run as well.
#[async_trait]
pub trait ContinuationPredicate: Send + Sync {
    async fn should_stop(&self) -> Result<bool, PredicateError>;
}

/// Any `Fn() -> impl Future<Output = Result<bool, PredicateError>>` is a predicate.
#[async_trait]
impl<F, Fut> ContinuationPredicate for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
{
    async fn should_stop(&self) -> Result<bool, PredicateError> {
        (self)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closures_are_predicates() {
        let stop = || async { Ok::<_, PredicateError>(true) };
        assert!(stop.should_stop().await.unwrap());

        let broken = || async { Err::<bool, _>(PredicateError::new("no clock")) };
        let err = broken.should_stop().await.unwrap_err();
        assert!(err.to_string().contains("no clock"));
    }
}
