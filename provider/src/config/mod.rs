/// Provider configuration
///
/// Layered loading:
/// 1. Defaults (from code)
/// 2. Config file (googleworkspace.toml)
/// 3. Environment variables (GOOGLEWORKSPACE_* prefix)
///
/// # Example
///
/// ```no_run
/// use gworkspace_provider::config::ConfigLoader;
///
/// // Load from default locations
/// let config = ConfigLoader::load_default().expect("Failed to load config");
///
/// // Or load from specific file
/// let config = ConfigLoader::new()
///     .with_file("./googleworkspace.toml")
///     .load()
///     .expect("Failed to load config");
/// ```
pub mod error;
pub mod loader;

pub use error::{ConfigError, Result};
pub use loader::{
    CLOUD_IDENTITY_GROUPS_SCOPE, ConfigLoader, ENV_PREFIX, EndpointsConfig,
    GMAIL_SETTINGS_SHARING_SCOPE, ProviderConfig, RetryConfig,
};
