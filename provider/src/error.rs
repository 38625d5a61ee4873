//! Error types for provider operations

use gworkspace_retry::RetryError;
use thiserror::Error;

/// Provider result type alias
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider error taxonomy
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An API call failed permanently or ran out of retries.
    #[error(transparent)]
    Retry(#[from] RetryError),

    #[error("Failed to decode API response: {source}")]
    JsonDecode {
        #[from]
        source: serde_json::Error,
    },

    #[error("Unexpected format of ID ({id:?}), expected {expected}")]
    InvalidImportId { id: String, expected: &'static str },

    #[error("Attribute {attribute:?} must be a {expected}")]
    InvalidAttributeType {
        attribute: String,
        expected: &'static str,
    },

    #[error("Invalid endpoint URL {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// True when the failing API call ended on a 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::Retry(err) => err.is_not_found(),
            _ => false,
        }
    }
}

impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        ProviderError::Other(s)
    }
}

impl From<&str> for ProviderError {
    fn from(s: &str) -> Self {
        ProviderError::Other(s.to_string())
    }
}
