use crate::config::error::{ConfigError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable prefix, e.g. `GOOGLEWORKSPACE_CUSTOMER_ID`.
pub const ENV_PREFIX: &str = "GOOGLEWORKSPACE";

const REDACTED: &str = "<redacted>";

/// Root provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Workspace customer id, used as the parent of every group
    #[serde(default)]
    pub customer_id: String,

    /// OAuth access token sent as a bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// OAuth scopes granted to the access token. Resources whose API scope
    /// is missing fail before any request is sent.
    #[serde(default = "default_oauth_scopes")]
    pub oauth_scopes: Vec<String>,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Base URLs of the APIs, overridable for testing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointsConfig {
    #[serde(default = "default_cloud_identity_endpoint")]
    pub cloud_identity: String,

    #[serde(default = "default_gmail_endpoint")]
    pub gmail: String,
}

/// Backoff settings applied to every API call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum retries per call; unset means bounded by the resource timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<usize>,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f32,

    #[serde(default = "default_true")]
    pub jitter: bool,
}

pub const CLOUD_IDENTITY_GROUPS_SCOPE: &str = "https://www.googleapis.com/auth/cloud-identity.groups";
pub const GMAIL_SETTINGS_SHARING_SCOPE: &str =
    "https://www.googleapis.com/auth/gmail.settings.sharing";

fn default_oauth_scopes() -> Vec<String> {
    vec![
        CLOUD_IDENTITY_GROUPS_SCOPE.to_string(),
        GMAIL_SETTINGS_SHARING_SCOPE.to_string(),
    ]
}
fn default_cloud_identity_endpoint() -> String {
    "https://cloudidentity.googleapis.com/v1/".to_string()
}
fn default_gmail_endpoint() -> String {
    "https://gmail.googleapis.com/gmail/v1/".to_string()
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    10_000
}
fn default_backoff_multiplier() -> f32 {
    2.0
}
fn default_true() -> bool {
    true
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            cloud_identity: default_cloud_identity_endpoint(),
            gmail: default_gmail_endpoint(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_true(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            customer_id: String::new(),
            access_token: None,
            oauth_scopes: default_oauth_scopes(),
            endpoints: EndpointsConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl RetryConfig {
    /// Retry settings for one operation bounded by `timeout`.
    pub fn for_timeout(&self, timeout: Duration) -> gworkspace_retry::RetryConfig {
        gworkspace_retry::RetryConfig {
            max_attempts: self.max_attempts,
            initial_backoff_ms: self.initial_backoff_ms,
            max_backoff_ms: self.max_backoff_ms,
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
            max_elapsed_ms: Some(timeout.as_millis() as u64),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.customer_id.trim().is_empty() {
            return Err(ConfigError::MissingField("customer_id".to_string()));
        }

        for (field, endpoint) in [
            ("endpoints.cloud_identity", &self.endpoints.cloud_identity),
            ("endpoints.gmail", &self.endpoints.gmail),
        ] {
            let url = Url::parse(endpoint).map_err(|e| ConfigError::ValidationError {
                field: field.to_string(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::ValidationError {
                    field: field.to_string(),
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                });
            }
        }

        let retry = &self.retry;
        if retry.initial_backoff_ms == 0 {
            return Err(ConfigError::ValidationError {
                field: "retry.initial_backoff_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if retry.initial_backoff_ms > retry.max_backoff_ms {
            return Err(ConfigError::ValidationError {
                field: "retry.max_backoff_ms".to_string(),
                reason: format!(
                    "must be at least initial_backoff_ms ({})",
                    retry.initial_backoff_ms
                ),
            });
        }
        if retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::ValidationError {
                field: "retry.backoff_multiplier".to_string(),
                reason: "must be at least 1.0".to_string(),
            });
        }

        Ok(())
    }

    /// Copy safe to print: the access token is masked.
    pub fn redacted(&self) -> Self {
        Self {
            access_token: self.access_token.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Builds a [`ProviderConfig`] from defaults, an optional TOML file and the
/// `GOOGLEWORKSPACE_` environment, later sources winning.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn load(&self) -> Result<ProviderConfig> {
        let defaults = serde_json::to_string(&ProviderConfig::default())?;
        let mut builder =
            Config::builder().add_source(File::from_str(&defaults, config::FileFormat::Json));

        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            builder = builder.add_source(File::from(path.as_path()));
        }

        // Nested keys use a double underscore: GOOGLEWORKSPACE_RETRY__JITTER.
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("oauth_scopes"),
        );

        let config: ProviderConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            customer_id = %config.customer_id,
            file = ?self.config_path,
            "Loaded provider configuration"
        );
        Ok(config)
    }

    /// First existing file among `./googleworkspace.toml`, the platform
    /// config dir and `~/.googleworkspace.toml`.
    pub fn find_config_file() -> Option<PathBuf> {
        [
            Some(PathBuf::from("./googleworkspace.toml")),
            dirs::config_dir().map(|dir| dir.join("googleworkspace").join("config.toml")),
            dirs::home_dir().map(|dir| dir.join(".googleworkspace.toml")),
        ]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
    }

    pub fn load_default() -> Result<ProviderConfig> {
        Self::find_config_file()
            .map_or_else(Self::new, |path| Self::new().with_file(path))
            .load()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
