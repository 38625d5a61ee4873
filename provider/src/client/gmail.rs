//! Gmail delegates REST adapter

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

use super::rest::RestClient;
use super::{ApiResult, Delegate, DelegatesApi, DelegatesFactory};
use crate::error::Result;

/// Gmail API over `https://gmail.googleapis.com/gmail/v1/`.
#[derive(Debug, Clone)]
pub struct GmailClient {
    rest: RestClient,
}

impl GmailClient {
    pub fn new(http: reqwest::Client, endpoint: &str, access_token: Option<String>) -> Result<Self> {
        Ok(Self {
            rest: RestClient::new(http, endpoint, access_token)?,
        })
    }

    pub fn delegates(&self, user_id: &str) -> GmailDelegates {
        GmailDelegates {
            rest: self.rest.clone(),
            user_id: user_id.to_string(),
        }
    }
}

impl DelegatesFactory for GmailClient {
    fn delegates_for(&self, user_id: &str) -> Arc<dyn DelegatesApi> {
        Arc::new(self.delegates(user_id))
    }
}

/// `users.settings.delegates` of a single mailbox.
#[derive(Debug, Clone)]
pub struct GmailDelegates {
    rest: RestClient,
    user_id: String,
}

impl GmailDelegates {
    fn path(&self, delegate_email: Option<&str>) -> String {
        let user = urlencoding::encode(&self.user_id);
        match delegate_email {
            Some(email) => format!(
                "users/{user}/settings/delegates/{}",
                urlencoding::encode(email)
            ),
            None => format!("users/{user}/settings/delegates"),
        }
    }
}

#[async_trait]
impl DelegatesApi for GmailDelegates {
    async fn create(&self, delegate_email: &str) -> ApiResult<Delegate> {
        let url = self.rest.url(&self.path(None))?;
        let request = self
            .rest
            .request(Method::POST, url)
            .json(&json!({ "delegateEmail": delegate_email }));
        self.rest.send_json(request).await
    }

    async fn get(&self, delegate_email: &str) -> ApiResult<Delegate> {
        let url = self.rest.url(&self.path(Some(delegate_email)))?;
        self.rest.send_json(self.rest.request(Method::GET, url)).await
    }

    async fn delete(&self, delegate_email: &str) -> ApiResult<()> {
        let url = self.rest.url(&self.path(Some(delegate_email)))?;
        self.rest
            .send_empty(self.rest.request(Method::DELETE, url))
            .await
    }
}
