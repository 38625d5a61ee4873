use async_trait::async_trait;

use super::DataSource;
use crate::client::ApiClient;
use crate::config::CLOUD_IDENTITY_GROUPS_SCOPE;
use crate::diag::Diagnostics;
use crate::resource_data::ResourceData;
use crate::resources::{DynamicGroupResource, Resource};
use crate::schema::Schema;

pub const TYPE_NAME: &str = "googleworkspace_dynamic_group";

/// Looks up a dynamic group by id or by email address.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicGroupDataSource {
    resource: DynamicGroupResource,
}

impl DynamicGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(email: &str) -> Diagnostics {
        Diagnostics::error(format!("No dynamic group was returned for {email}."))
    }
}

#[async_trait]
impl DataSource for DynamicGroupDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn description(&self) -> &'static str {
        "Dynamic Group data source in the Terraform Googleworkspace provider. \
         Dynamic Group resides under the `https://www.googleapis.com/auth/cloud-identity.groups` client scope."
    }

    fn oauth_scope(&self) -> &'static str {
        CLOUD_IDENTITY_GROUPS_SCOPE
    }

    fn schema(&self) -> Schema {
        self.resource
            .schema()
            .for_data_source()
            .with_exactly_one_of(&["id", "email"])
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let lookup = data.get_string("email");

        if let Some(id) = data.get_str("id").filter(|id| !id.is_empty()) {
            let id = id.to_string();
            data.set_id(id);
        } else {
            let timeout = self.resource.timeouts().read;
            let groups = client.groups();
            let email = lookup.as_str();
            let name = match client
                .call("look up dynamic group", timeout, move || groups.lookup(email))
                .await
            {
                Ok(name) => name,
                Err(err) => return Diagnostics::from_error(err),
            };
            if name.is_empty() {
                return Self::missing(&lookup);
            }

            let name = name.as_str();
            let group = match client
                .call("get dynamic group", timeout, move || groups.get(name))
                .await
            {
                Ok(group) => group,
                Err(err) => return Diagnostics::from_error(err),
            };
            match group.name {
                Some(name) if !name.is_empty() => data.set_id(name),
                _ => return Self::missing(&lookup),
            }
        }

        let diags = self.resource.read(client, data).await;
        if !diags.has_error() && data.id().is_none() {
            let key = if lookup.is_empty() {
                data.get_string("id")
            } else {
                lookup
            };
            return Self::missing(&key);
        }
        diags
    }
}
