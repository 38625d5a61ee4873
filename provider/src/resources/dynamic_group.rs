use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use super::{Resource, Timeouts, handle_not_found_error};
use crate::client::{
    ApiClient, DynamicGroupMetadata, DynamicGroupQuery, EntityKey, Group, is_group_name,
};
use crate::config::CLOUD_IDENTITY_GROUPS_SCOPE;
use crate::diag::Diagnostics;
use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, string_len_between};

pub const TYPE_NAME: &str = "googleworkspace_dynamic_group";

/// Label applied when the configuration sets none.
pub const DISCUSSION_FORUM_LABEL: &str = "cloudidentity.googleapis.com/groups.discussion_forum";

/// Groups are created without owners or members.
const INITIAL_GROUP_CONFIG: &str = "EMPTY";

const CREATE_UPDATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicGroupResource;

impl DynamicGroupResource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Resource for DynamicGroupResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn description(&self) -> &'static str {
        "Dynamic Group resource manages Google Workspace Groups with Dynamic memberships. \
         Dynamic Group resides under the `https://www.googleapis.com/auth/cloud-identity.groups` client scope."
    }

    fn oauth_scope(&self) -> &'static str {
        CLOUD_IDENTITY_GROUPS_SCOPE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute(
                "id",
                Attribute::string()
                    .computed()
                    .description("The unique ID of a group. A group id can be used as a group request URI's groupKey."),
            )
            .attribute(
                "email",
                Attribute::string().required().description(
                    "The group's email address. If your account has multiple domains, \
                     select the appropriate domain for the email address. The email must be unique.",
                ),
            )
            .attribute(
                "name",
                Attribute::string()
                    .optional()
                    .computed()
                    .description("The group's display name."),
            )
            .attribute(
                "query",
                Attribute::string()
                    .required()
                    .description("The dynamic group query."),
            )
            .attribute(
                "description",
                Attribute::string()
                    .optional()
                    .validate_with(string_len_between(0, 4096))
                    .description(
                        "An extended description to help users determine the purpose of a group. \
                         For example, you can include information about who should join the group, \
                         the types of messages to send to the group, links to FAQs about the group, or related groups.",
                    ),
            )
            .attribute(
                "labels",
                Attribute::map()
                    .optional()
                    .default_value(Value::Object(Map::from_iter([(
                        DISCUSSION_FORUM_LABEL.to_string(),
                        Value::String(String::new()),
                    )])))
                    .description(
                        "One or more label entries that apply to the Group. \
                         Currently supported labels contain a key with an empty value.",
                    ),
            )
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::with_create_update(CREATE_UPDATE_TIMEOUT)
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let email = data.get_string("email");
        tracing::debug!("Creating Dynamic Group {email:?}");

        let labels = match data.get_string_map("labels") {
            Ok(labels) => labels,
            Err(err) => return Diagnostics::from_error(err),
        };
        let group = Group {
            group_key: Some(EntityKey { id: email.clone() }),
            parent: Some(format!("customerId/{}", client.customer_id())),
            display_name: Some(data.get_string("name")),
            description: Some(data.get_string("description")),
            labels: Some(labels),
            dynamic_group_metadata: Some(DynamicGroupMetadata {
                queries: vec![DynamicGroupQuery::users(data.get_string("query"))],
            }),
            ..Group::default()
        };

        let groups = client.groups();
        let group = &group;
        let operation = match client
            .call("create dynamic group", self.timeouts().create, move || {
                groups.create(group, INITIAL_GROUP_CONFIG)
            })
            .await
        {
            Ok(operation) => operation,
            Err(err) => return Diagnostics::from_error(err),
        };

        let Some(name) = operation.group_name() else {
            return Diagnostics::error(format!(
                "Create of dynamic group {email:?} returned no group name"
            ));
        };
        data.set_id(name);
        tracing::info!("Created Dynamic Group {name:?}: {email:?}");

        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let id = data.id().unwrap_or_default().to_string();
        tracing::debug!("Reading Dynamic Group {id:?}");

        let groups = client.groups();
        let name = id.as_str();
        let group = match client
            .call("get dynamic group", self.timeouts().read, move || groups.get(name))
            .await
        {
            Ok(group) => group,
            Err(err) => {
                let resource = data.get_string("email");
                return handle_not_found_error(err, data, &resource);
            }
        };

        data.set("name", group.display_name.clone().unwrap_or_default());
        data.set(
            "email",
            group
                .group_key
                .as_ref()
                .map(|key| key.id.clone())
                .unwrap_or_default(),
        );
        data.set("description", group.description.clone().unwrap_or_default());
        data.set("query", group.first_query().unwrap_or_default());
        data.set(
            "labels",
            Value::Object(
                group
                    .labels
                    .clone()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
        );
        data.set_id(group.name.clone().unwrap_or(id));
        tracing::info!("Read Dynamic Group {:?}", data.id().unwrap_or_default());

        Diagnostics::new()
    }

    async fn update(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let email = data.get_string("email");
        let id = data.id().unwrap_or_default().to_string();
        tracing::debug!("Updating Dynamic Group {id:?}: {email:?}");

        if data.has_change("email") && data.has_changes_except(&["email"]) {
            return Diagnostics::error(
                "If you change the email address of a group, you must only change the email address.",
            );
        }
        if data.has_change("query") && data.has_changes_except(&["query"]) {
            return Diagnostics::error(
                "If you change the query of a group, you must only change the query.",
            );
        }

        let (patch, update_mask) = match build_patch(data) {
            Ok(patch) => patch,
            Err(err) => return Diagnostics::from_error(err),
        };

        if !update_mask.is_empty() {
            let mask = update_mask.join(",");
            let groups = client.groups();
            let (name, patch, mask) = (id.as_str(), &patch, mask.as_str());
            let operation = match client
                .call("patch dynamic group", self.timeouts().update, move || {
                    groups.patch(name, patch, mask)
                })
                .await
            {
                Ok(operation) => operation,
                Err(err) => return Diagnostics::from_error(err),
            };
            if let Some(name) = operation.group_name() {
                data.set_id(name);
            }
        }

        tracing::info!("Finished updating Dynamic Group {:?}: {email:?}", data.id().unwrap_or_default());
        self.read(client, data).await
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let id = data.id().unwrap_or_default().to_string();
        tracing::debug!("Deleting Dynamic Group {id:?}");

        let groups = client.groups();
        let name = id.as_str();
        if let Err(err) = client
            .call("delete dynamic group", self.timeouts().delete, move || groups.delete(name))
            .await
        {
            let resource = data.get_string("email");
            return handle_not_found_error(err, data, &resource);
        }

        data.clear_id();
        tracing::info!("Deleted Dynamic Group {id:?}");
        Diagnostics::new()
    }

    fn import(&self, id: &str) -> crate::Result<ResourceData> {
        if !is_group_name(id) {
            return Err(ProviderError::InvalidImportId {
                id: id.to_string(),
                expected: "groups/<id>",
            });
        }
        let mut data = ResourceData::new();
        data.set_id(id);
        Ok(data)
    }
}

/// Patch body and update mask for the changed attributes.
fn build_patch(data: &ResourceData) -> crate::Result<(Group, Vec<&'static str>)> {
    let mut group = Group::default();
    let mut update_mask = Vec::new();

    if data.has_change("email") {
        group.group_key = Some(EntityKey {
            id: data.get_string("email"),
        });
        update_mask.push("groupKey");
    }
    if data.has_change("name") {
        group.display_name = Some(data.get_string("name"));
        update_mask.push("displayName");
    }
    if data.has_change("description") {
        group.description = Some(data.get_string("description"));
        update_mask.push("description");
    }
    if data.has_change("query") {
        group.dynamic_group_metadata = Some(DynamicGroupMetadata {
            queries: vec![DynamicGroupQuery::users(data.get_string("query"))],
        });
        update_mask.push("dynamicGroupMetadata");
    }
    if data.has_change("labels") {
        group.labels = Some(data.get_string_map("labels")?);
        update_mask.push("labels");
    }

    Ok((group, update_mask))
}
