//! Standard retry predicates applied to every API request

use std::time::Duration;

use crate::classifier::Predicate;
use crate::classifier::RetryDecision;
use crate::fault::ApiFault;
use crate::fault::Fault;

/// Pause requested before retrying a rate-limited call.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(10);

const CONNECTION_RESET_BY_PEER: &str = ": connection reset by peer";

const LOGIN_REQUIRED: &str = "Login Required";

/// Returned spuriously for a short while after a successful create.
const NOT_AUTHORIZED: &str = "Not Authorized to access this resource/api";

const QUOTA_EXCEEDED: [&str; 2] = ["Quota exceeded", "quotaExceeded"];

/// The chain used by every request, in evaluation order.
pub fn default_predicates() -> [Predicate; 6] {
    [
        // Common network errors
        Predicate::new("network_temporary", is_network_temporary_error),
        Predicate::new("network_timeout", is_network_timeout_error),
        Predicate::new("unexpected_eof", is_io_eof_error),
        Predicate::new("connection_reset", is_connection_reset_network_error),
        // Common error codes
        Predicate::new("common_retryable_code", is_common_retryable_error_code),
        Predicate::new("rate_limit", is_rate_limit_exceeded),
    ]
}

pub fn is_network_temporary_error(fault: &Fault) -> RetryDecision {
    match fault {
        Fault::Network {
            temporary: true, ..
        } => RetryDecision::retry("marked as timeout"),
        _ => RetryDecision::no_retry(),
    }
}

pub fn is_network_timeout_error(fault: &Fault) -> RetryDecision {
    match fault {
        Fault::Network { timeout: true, .. } => RetryDecision::retry("marked as timeout"),
        _ => RetryDecision::no_retry(),
    }
}

pub fn is_io_eof_error(fault: &Fault) -> RetryDecision {
    match fault {
        Fault::Stream {
            unexpected_eof: true,
            ..
        } => RetryDecision::retry("Got unexpected EOF"),
        _ => RetryDecision::no_retry(),
    }
}

pub fn is_connection_reset_network_error(fault: &Fault) -> RetryDecision {
    let message = fault.to_string();
    if message.ends_with(CONNECTION_RESET_BY_PEER) {
        RetryDecision::retry(format!("reset connection error: {message}"))
    } else {
        RetryDecision::no_retry()
    }
}

/// 500/502/503, plus the 401/403 bodies the API returns while a fresh
/// mutation is still propagating.
pub fn is_common_retryable_error_code(fault: &Fault) -> RetryDecision {
    let Some(api) = fault.as_api() else {
        return RetryDecision::no_retry();
    };

    let retryable = match api.code {
        500 | 502 | 503 => true,
        401 => api.body.contains(LOGIN_REQUIRED),
        403 => api.body.contains(NOT_AUTHORIZED),
        _ => false,
    };

    if retryable {
        retryable_code(api)
    } else {
        RetryDecision::no_retry()
    }
}

/// 429, quota 403s, and every other 403. All of them ask for
/// [`RATE_LIMIT_DELAY`] before the next attempt.
pub fn is_rate_limit_exceeded(fault: &Fault) -> RetryDecision {
    let Some(api) = fault.as_api() else {
        return RetryDecision::no_retry();
    };

    match api.code {
        429 => retryable_code(api).with_delay(RATE_LIMIT_DELAY),
        403 if is_quota_exceeded(api) => retryable_code(api).with_delay(RATE_LIMIT_DELAY),
        403 => RetryDecision::retry(format!(
            "Retryable error code {} (unrecognized 403; retried as a possible propagation delay, \
             a genuine permission error will keep failing)",
            api.code
        ))
        .with_delay(RATE_LIMIT_DELAY),
        _ => RetryDecision::no_retry(),
    }
}

fn is_quota_exceeded(api: &ApiFault) -> bool {
    let message = api.to_string();
    QUOTA_EXCEEDED
        .iter()
        .any(|needle| message.contains(needle))
}

fn retryable_code(api: &ApiFault) -> RetryDecision {
    RetryDecision::retry(format!("Retryable error code {}", api.code))
}
