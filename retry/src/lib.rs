//! Retry classification for Google Workspace API calls
//!
//! This crate provides:
//! - A tagged fault model for failed API calls ([`Fault`])
//! - An ordered, immutable predicate chain deciding retry-or-not plus a
//!   reason and an optional requested delay ([`RetryClassifier`])
//! - The not-found check used for state reconciliation ([`is_not_found`])
//! - A cancellable retry loop honouring those decisions
//!   ([`execute_with_retry`])

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod classifier;
pub mod fault;
pub mod predicates;
pub mod strategy;

pub use classifier::{Predicate, RetryClassifier, RetryDecision};
pub use fault::{ApiFault, Fault, is_not_found};
pub use predicates::RATE_LIMIT_DELAY;
pub use strategy::{RetryConfig, RetryStatus, execute_with_retry};

use std::time::Duration;

/// Retry module result type
pub type Result<T> = std::result::Result<T, RetryError>;

/// Why a retried operation finally failed.
///
/// Every variant carrying a fault keeps its full text so operators can tell
/// a persistent 503 from a permission error.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// The classifier did not consider the fault transient.
    #[error("{0}")]
    Permanent(Fault),

    /// The operation's time budget ran out while the fault was still
    /// considered transient.
    #[error("timeout after {elapsed:?} while retrying ({reason}): {last}")]
    Timeout {
        elapsed: Duration,
        reason: String,
        last: Fault,
    },

    #[error("giving up after {attempts} attempts ({reason}): {last}")]
    Exhausted {
        attempts: u32,
        reason: String,
        last: Fault,
    },

    #[error("retry aborted by cancellation")]
    Aborted,
}

impl RetryError {
    /// The last fault seen, if the operation failed with one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            RetryError::Permanent(fault)
            | RetryError::Timeout { last: fault, .. }
            | RetryError::Exhausted { last: fault, .. } => Some(fault),
            RetryError::Aborted => None,
        }
    }

    /// True when the operation ended on a 404.
    pub fn is_not_found(&self) -> bool {
        is_not_found(self.fault())
    }
}
