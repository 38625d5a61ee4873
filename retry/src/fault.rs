//! Fault model for failed API calls
//!
//! Every failure surfaced by an API client is normalised into one of the
//! [`Fault`] variants so retry predicates can pattern-match on an explicit
//! shape instead of probing concrete error types.

use serde::Deserialize;
use std::fmt;
use std::io::ErrorKind;

/// HTTP status the upstream API uses for a missing entity.
const NOT_FOUND: u16 = 404;

/// A failure reported by an API call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// Network-layer failure (dial, read, write) with the flags reported by
    /// the transport.
    #[error("{message}")]
    Network {
        message: String,
        temporary: bool,
        timeout: bool,
    },

    /// The response stream ended or broke while being read.
    #[error("{message}")]
    Stream {
        message: String,
        unexpected_eof: bool,
    },

    /// Structured error returned by the upstream API.
    #[error(transparent)]
    Api(ApiFault),

    /// Anything else, known only by its message.
    #[error("{0}")]
    Generic(String),
}

impl Fault {
    pub fn network(message: impl Into<String>, temporary: bool, timeout: bool) -> Self {
        Fault::Network {
            message: message.into(),
            temporary,
            timeout,
        }
    }

    /// The "unexpected EOF" sentinel, optionally wrapped by the request URL.
    pub fn unexpected_eof(url: Option<&str>) -> Self {
        let message = match url {
            Some(url) => format!("{url}: unexpected EOF"),
            None => "unexpected EOF".to_string(),
        };
        Fault::Stream {
            message,
            unexpected_eof: true,
        }
    }

    pub fn api(code: u16, body: impl Into<String>) -> Self {
        Fault::Api(ApiFault::from_response(code, body))
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Fault::Generic(message.into())
    }

    /// The structured API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiFault> {
        match self {
            Fault::Api(api) => Some(api),
            _ => None,
        }
    }

    /// True iff the upstream API answered 404.
    pub fn is_not_found(&self) -> bool {
        self.as_api().is_some_and(|api| api.code == NOT_FOUND)
    }
}

/// Reports whether `fault` is the server replying with 404.
///
/// Handlers use this to treat a missing entity on read or delete as already
/// reconciled. `None` is never "not found".
pub fn is_not_found(fault: Option<&Fault>) -> bool {
    fault.is_some_and(Fault::is_not_found)
}

/// Status code and raw body of an API error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFault {
    pub code: u16,
    /// Message from the Google error envelope, empty when the body had none.
    pub message: String,
    /// `reason` of every entry in the envelope's `errors` list.
    pub reasons: Vec<String>,
    /// Raw response body.
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: String,
}

impl ApiFault {
    /// Builds a fault from a non-success response, parsing the Google error
    /// envelope when the body carries one.
    pub fn from_response(code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let (message, reasons) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (
                envelope.error.message,
                envelope
                    .error
                    .errors
                    .into_iter()
                    .map(|item| item.reason)
                    .filter(|reason| !reason.is_empty())
                    .collect(),
            ),
            Err(_) => (String::new(), Vec::new()),
        };
        Self {
            code,
            message,
            reasons,
            body,
        }
    }
}

impl fmt::Display for ApiFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            return write!(
                f,
                "googleapi: got HTTP response code {} with body: {}",
                self.code, self.body
            );
        }
        write!(f, "googleapi: Error {}: {}", self.code, self.message)?;
        for reason in &self.reasons {
            write!(f, ", {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiFault {}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::UnexpectedEof => Fault::Stream {
                message: err.to_string(),
                unexpected_eof: true,
            },
            ErrorKind::TimedOut => Fault::network(err.to_string(), false, true),
            ErrorKind::Interrupted | ErrorKind::WouldBlock => {
                Fault::network(err.to_string(), true, false)
            }
            _ => Fault::Generic(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for Fault {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);

        if err.is_timeout() {
            return Fault::network(message, false, true);
        }
        if err.is_connect() {
            return Fault::network(message, true, false);
        }
        if source_io_kind(&err) == Some(ErrorKind::UnexpectedEof) {
            return Fault::Stream {
                message,
                unexpected_eof: true,
            };
        }
        if let Some(status) = err.status() {
            return Fault::Api(ApiFault::from_response(status.as_u16(), ""));
        }
        Fault::Generic(message)
    }
}

/// Joins an error and all of its sources with `": "`, innermost last.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

fn source_io_kind(err: &dyn std::error::Error) -> Option<ErrorKind> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = inner.source();
    }
    None
}
