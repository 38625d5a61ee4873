//! Managed resources

mod dynamic_group;
mod user_delegate;

pub use dynamic_group::DynamicGroupResource;
pub use user_delegate::UserDelegateResource;

use async_trait::async_trait;
use std::time::Duration;

use crate::client::ApiClient;
use crate::diag::Diagnostics;
use crate::error::{ProviderError, Result};
use crate::resource_data::ResourceData;
use crate::schema::Schema;

/// Per-operation time budgets; retries stop once one runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Timeouts {
    pub const DEFAULT: Duration = Duration::from_secs(20 * 60);

    pub fn with_create_update(timeout: Duration) -> Self {
        Self {
            create: timeout,
            update: timeout,
            ..Self::default()
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Self::DEFAULT,
            read: Self::DEFAULT,
            update: Self::DEFAULT,
            delete: Self::DEFAULT,
        }
    }
}

/// A managed object type with create/read/update/delete and import.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// OAuth scope the backing API requires.
    fn oauth_scope(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics;

    /// Refresh `data` from the API. Clears the id if the object is gone.
    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics;

    async fn update(&self, _client: &ApiClient, _data: &mut ResourceData) -> Diagnostics {
        Diagnostics::error(format!(
            "{} does not support in-place updates",
            self.type_name()
        ))
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics;

    /// State for an imported id, before it is refreshed with [`Resource::read`].
    fn import(&self, id: &str) -> Result<ResourceData> {
        let mut data = ResourceData::new();
        data.set_id(id);
        Ok(data)
    }
}

/// Reconciles state after a failed read or delete.
///
/// A 404 means the object is already gone: the id is cleared and no
/// diagnostics are returned. Anything else is surfaced as an error.
pub fn handle_not_found_error(
    err: ProviderError,
    data: &mut ResourceData,
    resource: &str,
) -> Diagnostics {
    if err.is_not_found() {
        tracing::warn!("Removing {resource} because it's gone");
        data.clear_id();
        return Diagnostics::new();
    }
    Diagnostics::error(format!("Error when reading or editing {resource}: {err}"))
}
