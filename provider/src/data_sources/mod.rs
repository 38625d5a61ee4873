//! Read-only data sources

mod dynamic_group;

pub use dynamic_group::DynamicGroupDataSource;

use async_trait::async_trait;

use crate::client::ApiClient;
use crate::diag::Diagnostics;
use crate::resource_data::ResourceData;
use crate::schema::Schema;

/// A read-only lookup of an existing object.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn oauth_scope(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics;
}
