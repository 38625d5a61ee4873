use async_trait::async_trait;
use std::time::Duration;

use super::{Resource, Timeouts, handle_not_found_error};
use crate::client::ApiClient;
use crate::config::GMAIL_SETTINGS_SHARING_SCOPE;
use crate::diag::Diagnostics;
use crate::error::{ProviderError, Result};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema};

pub const TYPE_NAME: &str = "googleworkspace_user_delegate";

const CREATE_UPDATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const IMPORT_ID_FORMAT: &str = "user_id:delegate_email";

#[derive(Debug, Clone, Copy, Default)]
pub struct UserDelegateResource;

impl UserDelegateResource {
    pub fn new() -> Self {
        Self
    }
}

fn resource_id(user_id: &str, delegate_email: &str) -> String {
    format!("{user_id}:{delegate_email}")
}

/// Splits `user_id:delegate_email`; both parts must be non-empty.
fn parse_import_id(id: &str) -> Result<(&str, &str)> {
    let invalid = || ProviderError::InvalidImportId {
        id: id.to_string(),
        expected: IMPORT_ID_FORMAT,
    };
    let parts: Vec<&str> = id.split(':').collect();
    match parts.as_slice() {
        [user_id, delegate_email] if !user_id.is_empty() && !delegate_email.is_empty() => {
            Ok((*user_id, *delegate_email))
        }
        _ => Err(invalid()),
    }
}

#[async_trait]
impl Resource for UserDelegateResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn description(&self) -> &'static str {
        "User Delegate resource manages delegation of access to a Gmail user mailbox. \
         User Delegate resides under the `https://www.googleapis.com/auth/gmail.settings.sharing` client scope."
    }

    fn oauth_scope(&self) -> &'static str {
        GMAIL_SETTINGS_SHARING_SCOPE
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attribute(
                "user_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("The user's email address."),
            )
            .attribute(
                "delegate_email",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("The email address of the delegate."),
            )
            .attribute(
                "delegate_verification_status",
                Attribute::string().computed().description(
                    "Indicates whether this address has been verified and can act as a delegate for the account. Read-only.",
                ),
            )
            .attribute(
                "id",
                Attribute::string()
                    .computed()
                    .description("The ID of this resource."),
            )
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::with_create_update(CREATE_UPDATE_TIMEOUT)
    }

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let user_id = data.get_string("user_id");
        let delegate_email = data.get_string("delegate_email");
        tracing::info!("Creating delegate {delegate_email:?} for user {user_id:?}");

        let delegates = client.delegates_for(&user_id);
        let (api, email) = (&*delegates, delegate_email.as_str());
        let delegate = match client
            .call("create delegate", self.timeouts().create, move || api.create(email))
            .await
        {
            Ok(delegate) => delegate,
            Err(err) => return Diagnostics::from_error(err),
        };

        data.set(
            "delegate_verification_status",
            delegate.verification_status.unwrap_or_default(),
        );
        data.set_id(resource_id(&user_id, &delegate_email));
        tracing::info!("Created delegate {delegate_email:?} for user {user_id:?}");

        self.read(client, data).await
    }

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let user_id = data.get_string("user_id");
        let delegate_email = data.get_string("delegate_email");
        tracing::info!("Reading delegate {delegate_email:?} for user {user_id:?}");

        let delegates = client.delegates_for(&user_id);
        let (api, email) = (&*delegates, delegate_email.as_str());
        let delegate = match client
            .call("get delegate", self.timeouts().read, move || api.get(email))
            .await
        {
            Ok(delegate) => delegate,
            Err(err) => {
                let resource = data.id().unwrap_or_default().to_string();
                return handle_not_found_error(err, data, &resource);
            }
        };

        data.set_id(resource_id(&user_id, &delegate_email));
        data.set("user_id", user_id.as_str());
        data.set("delegate_email", delegate.delegate_email);
        data.set(
            "delegate_verification_status",
            delegate.verification_status.unwrap_or_default(),
        );
        tracing::info!("Read delegate {delegate_email:?} for user {user_id:?}");

        Diagnostics::new()
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Diagnostics {
        let user_id = data.get_string("user_id");
        let delegate_email = data.get_string("delegate_email");
        tracing::info!("Deleting delegate {delegate_email:?} for user {user_id:?}");

        let delegates = client.delegates_for(&user_id);
        let (api, email) = (&*delegates, delegate_email.as_str());
        if let Err(err) = client
            .call("delete delegate", self.timeouts().delete, move || api.delete(email))
            .await
        {
            let resource = data.id().unwrap_or_default().to_string();
            return handle_not_found_error(err, data, &resource);
        }

        data.clear_id();
        tracing::info!("Deleted delegate {delegate_email:?} for user {user_id:?}");
        Diagnostics::new()
    }

    fn import(&self, id: &str) -> Result<ResourceData> {
        let (user_id, delegate_email) = parse_import_id(id)?;
        let mut data = ResourceData::new();
        data.set_id(id);
        data.set("user_id", user_id);
        data.set("delegate_email", delegate_email);
        Ok(data)
    }
}
