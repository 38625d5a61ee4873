//! Retry classification over an ordered predicate chain

use std::sync::Arc;
use std::time::Duration;

use crate::fault::Fault;
use crate::predicates;

/// Outcome of classifying a fault.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetryDecision {
    pub should_retry: bool,
    /// Human-readable reason, empty when `should_retry` is false.
    pub reason: String,
    /// Pause requested before the next attempt.
    pub delay: Option<Duration>,
}

impl RetryDecision {
    pub fn no_retry() -> Self {
        Self::default()
    }

    pub fn retry(reason: impl Into<String>) -> Self {
        Self {
            should_retry: true,
            reason: reason.into(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A named check deciding whether a fault is worth retrying.
#[derive(Clone, Copy)]
pub struct Predicate {
    name: &'static str,
    check: fn(&Fault) -> RetryDecision,
}

impl Predicate {
    pub const fn new(name: &'static str, check: fn(&Fault) -> RetryDecision) -> Self {
        Self { name, check }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn evaluate(&self, fault: &Fault) -> RetryDecision {
        (self.check)(fault)
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// Immutable, ordered predicate chain. First match wins.
///
/// Cheap to clone and safe to share between concurrent operations.
#[derive(Debug, Clone)]
pub struct RetryClassifier {
    predicates: Arc<[Predicate]>,
}

impl RetryClassifier {
    pub fn new(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            predicates: predicates.into_iter().collect(),
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Runs the chain in order and reports the first predicate that asks for
    /// a retry. Returns [`RetryDecision::no_retry`] when nothing matches.
    pub fn classify(&self, fault: &Fault) -> RetryDecision {
        for predicate in self.predicates.iter() {
            let decision = predicate.evaluate(fault);
            if decision.should_retry {
                tracing::debug!(
                    predicate = predicate.name(),
                    reason = %decision.reason,
                    delay = ?decision.delay,
                    "Dismissed an error as retryable: {fault}"
                );
                return decision;
            }
        }
        RetryDecision::no_retry()
    }

    pub fn is_retryable(&self, fault: &Fault) -> bool {
        self.classify(fault).should_retry
    }
}

impl Default for RetryClassifier {
    /// Network faults, then common retryable codes, then rate limiting.
    fn default() -> Self {
        Self::new(predicates::default_predicates())
    }
}
