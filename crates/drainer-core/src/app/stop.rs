//! Ready-made continuation predicates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::ports::{ContinuationPredicate, PredicateError};

/// Never asks to stop; the run ends only when the queue is drained.
#[derive(Debug, Default, Clone, Copy)]
pub struct Never;

#[async_trait]
impl ContinuationPredicate for Never {
    async fn should_stop(&self) -> Result<bool, PredicateError> {
        Ok(false)
    }
}

/// Allows `limit` iterations, then stops on the next check.
#[derive(Debug)]
pub struct StopAfter {
    limit: u64,
    checks: AtomicU64,
}

impl StopAfter {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            checks: AtomicU64::new(0),
        }
    }

    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContinuationPredicate for StopAfter {
    async fn should_stop(&self) -> Result<bool, PredicateError> {
        let seen = self.checks.fetch_add(1, Ordering::Relaxed);
        Ok(seen >= self.limit)
    }
}

/// Stops once less than `margin` is left before `deadline`.
///
/// Meant for workers running under a hard time limit: a new batch is only
/// fetched while there is still time to finish it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    deadline: Instant,
    margin: Duration,
}

impl Deadline {
    pub fn at(deadline: Instant) -> Self {
        Self {
            deadline,
            margin: Duration::ZERO,
        }
    }

    pub fn after(budget: Duration) -> Self {
        Self::at(Instant::now() + budget)
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[async_trait]
impl ContinuationPredicate for Deadline {
    async fn should_stop(&self) -> Result<bool, PredicateError> {
        Ok(self.remaining() <= self.margin)
    }
}

/// Stops as soon as any inner predicate stops; the first error wins.
#[derive(Default)]
pub struct AnyOf {
    predicates: Vec<Box<dyn ContinuationPredicate>>,
}

impl AnyOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: impl ContinuationPredicate + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

#[async_trait]
impl ContinuationPredicate for AnyOf {
    async fn should_stop(&self) -> Result<bool, PredicateError> {
        for p in &self.predicates {
            if p.should_stop().await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn count_continues(p: &dyn ContinuationPredicate, max_checks: usize) -> usize {
        let mut n = 0;
        for _ in 0..max_checks {
            if p.should_stop().await.unwrap() {
                break;
            }
            n += 1;
        }
        n
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    #[tokio::test]
    async fn stop_after_allows_exactly_limit(#[case] limit: u64) {
        let p = StopAfter::new(limit);
        assert_eq!(count_continues(&p, 100).await as u64, limit);
        assert_eq!(p.checks(), limit + 1);
    }

    #[tokio::test]
    async fn never_keeps_going() {
        assert_eq!(count_continues(&Never, 50).await, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_respects_margin() {
        let p = Deadline::after(Duration::from_secs(10)).with_margin(Duration::from_secs(3));
        assert!(!p.should_stop().await.unwrap());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!p.should_stop().await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(p.should_stop().await.unwrap());
    }

    #[tokio::test]
    async fn any_of_stops_on_first_stop() {
        let p = AnyOf::new().with(Never).with(StopAfter::new(2));
        assert_eq!(p.len(), 2);
        assert_eq!(count_continues(&p, 10).await, 2);
    }

    #[tokio::test]
    async fn any_of_propagates_errors() {
        let p = AnyOf::new()
            .with(Never)
            .with(|| async { Err::<bool, _>(PredicateError::new("lost lease")) });
        assert!(p.should_stop().await.is_err());
    }

    #[tokio::test]
    async fn empty_any_of_never_stops() {
        assert!(!AnyOf::new().should_stop().await.unwrap());
    }
}
