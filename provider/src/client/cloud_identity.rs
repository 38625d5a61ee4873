//! Cloud Identity groups REST adapter

use async_trait::async_trait;
use gworkspace_retry::Fault;
use reqwest::Method;
use serde::Deserialize;

use super::rest::RestClient;
use super::{ApiResult, Group, GroupsApi, Operation};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct LookupGroupNameResponse {
    #[serde(default)]
    name: String,
}

/// True for a group resource name of the form `groups/<id>`.
pub fn is_group_name(name: &str) -> bool {
    name.strip_prefix("groups/").is_some_and(|id| {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && id != "."
            && id != ".."
    })
}

/// [`GroupsApi`] over `https://cloudidentity.googleapis.com/v1/`.
#[derive(Debug, Clone)]
pub struct CloudIdentityClient {
    rest: RestClient,
}

impl CloudIdentityClient {
    pub fn new(http: reqwest::Client, endpoint: &str, access_token: Option<String>) -> Result<Self> {
        Ok(Self {
            rest: RestClient::new(http, endpoint, access_token)?,
        })
    }

    fn group_url(&self, name: &str) -> ApiResult<url::Url> {
        if !is_group_name(name) {
            return Err(Fault::generic(format!(
                "invalid group name {name:?}, expected groups/<id>"
            )));
        }
        self.rest.url(name)
    }
}

#[async_trait]
impl GroupsApi for CloudIdentityClient {
    async fn create(&self, group: &Group, initial_group_config: &str) -> ApiResult<Operation> {
        let url = self.rest.url("groups")?;
        let request = self
            .rest
            .request(Method::POST, url)
            .query(&[("initialGroupConfig", initial_group_config)])
            .json(group);
        self.rest.send_json(request).await
    }

    async fn get(&self, name: &str) -> ApiResult<Group> {
        let url = self.group_url(name)?;
        self.rest.send_json(self.rest.request(Method::GET, url)).await
    }

    async fn patch(&self, name: &str, group: &Group, update_mask: &str) -> ApiResult<Operation> {
        let url = self.group_url(name)?;
        let request = self
            .rest
            .request(Method::PATCH, url)
            .query(&[("updateMask", update_mask)])
            .json(group);
        self.rest.send_json(request).await
    }

    async fn delete(&self, name: &str) -> ApiResult<Operation> {
        let url = self.group_url(name)?;
        self.rest
            .send_json(self.rest.request(Method::DELETE, url))
            .await
    }

    async fn lookup(&self, group_key_id: &str) -> ApiResult<String> {
        // A leading "./" keeps "groups:" from parsing as a scheme.
        let url = self.rest.url("./groups:lookup")?;
        let request = self
            .rest
            .request(Method::GET, url)
            .query(&[("groupKey.id", group_key_id)]);
        let response: LookupGroupNameResponse = self.rest.send_json(request).await?;
        Ok(response.name)
    }
}
