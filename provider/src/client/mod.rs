//! API clients consumed by the resource handlers
//!
//! Handlers only see the narrow [`GroupsApi`] and [`DelegatesApi`] traits.
//! [`ApiClient`] bundles them with the customer id and the retry policy, and
//! [`ApiClient::call`] runs every request through the retry classifier.

mod cloud_identity;
mod gmail;
mod rest;

pub use cloud_identity::{CloudIdentityClient, is_group_name};
pub use gmail::{GmailClient, GmailDelegates};

use async_trait::async_trait;
use gworkspace_retry::{Fault, RetryClassifier, RetryStatus, execute_with_retry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{ProviderConfig, RetryConfig};
use crate::error::{ProviderError, Result};

/// Result of a single API request, before any retrying.
pub type ApiResult<T> = std::result::Result<T, Fault>;

/// Identifier of a group, usually its email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKey {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicGroupQuery {
    pub resource_type: String,
    pub query: String,
}

impl DynamicGroupQuery {
    /// Query over the domain's users.
    pub fn users(query: impl Into<String>) -> Self {
        Self {
            resource_type: "USER".to_string(),
            query: query.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicGroupMetadata {
    #[serde(default)]
    pub queries: Vec<DynamicGroupQuery>,
}

/// Cloud Identity group. Unset fields are left out of request bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<EntityKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_group_metadata: Option<DynamicGroupMetadata>,
}

impl Group {
    /// Query of the first dynamic group query, if any.
    pub fn first_query(&self) -> Option<&str> {
        self.dynamic_group_metadata
            .as_ref()
            .and_then(|m| m.queries.first())
            .map(|q| q.query.as_str())
    }
}

/// Long-running operation returned by group mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Operation {
    /// Resource name of the group carried in the operation response.
    pub fn group_name(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// Gmail delegate of a mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegate {
    pub delegate_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,
}

/// Cloud Identity `groups` endpoints.
#[async_trait]
pub trait GroupsApi: Send + Sync {
    async fn create(&self, group: &Group, initial_group_config: &str) -> ApiResult<Operation>;

    async fn get(&self, name: &str) -> ApiResult<Group>;

    async fn patch(&self, name: &str, group: &Group, update_mask: &str) -> ApiResult<Operation>;

    async fn delete(&self, name: &str) -> ApiResult<Operation>;

    /// Resource name of the group keyed by `group_key_id`.
    async fn lookup(&self, group_key_id: &str) -> ApiResult<String>;
}

/// Gmail `users.settings.delegates` endpoints of one mailbox.
#[async_trait]
pub trait DelegatesApi: Send + Sync {
    async fn create(&self, delegate_email: &str) -> ApiResult<Delegate>;

    async fn get(&self, delegate_email: &str) -> ApiResult<Delegate>;

    async fn delete(&self, delegate_email: &str) -> ApiResult<()>;
}

/// Hands out a [`DelegatesApi`] acting as the given mailbox user.
pub trait DelegatesFactory: Send + Sync {
    fn delegates_for(&self, user_id: &str) -> Arc<dyn DelegatesApi>;
}

/// Everything a handler needs to talk to the APIs.
#[derive(Clone)]
pub struct ApiClient {
    customer_id: String,
    groups: Arc<dyn GroupsApi>,
    delegates: Arc<dyn DelegatesFactory>,
    classifier: RetryClassifier,
    retry: RetryConfig,
    cancel: CancellationToken,
    scopes: Vec<String>,
}

impl ApiClient {
    pub fn new(
        customer_id: impl Into<String>,
        groups: Arc<dyn GroupsApi>,
        delegates: Arc<dyn DelegatesFactory>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            groups,
            delegates,
            classifier: RetryClassifier::default(),
            retry: RetryConfig::default(),
            cancel: CancellationToken::new(),
            scopes: ProviderConfig::default().oauth_scopes,
        }
    }

    /// REST clients for the configured endpoints.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gworkspace-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::HttpClient(e.to_string()))?;
        let token = config.access_token.clone();

        let groups =
            CloudIdentityClient::new(http.clone(), &config.endpoints.cloud_identity, token.clone())?;
        let delegates = GmailClient::new(http, &config.endpoints.gmail, token)?;

        Ok(Self::new(config.customer_id.clone(), Arc::new(groups), Arc::new(delegates))
            .with_retry(config.retry.clone())
            .with_scopes(config.oauth_scopes.clone()))
    }

    pub fn with_classifier(mut self, classifier: RetryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Token whose cancellation aborts in-flight retries.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// OAuth scopes granted to the access token.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn groups(&self) -> &dyn GroupsApi {
        self.groups.as_ref()
    }

    pub fn delegates_for(&self, user_id: &str) -> Arc<dyn DelegatesApi> {
        self.delegates.delegates_for(user_id)
    }

    pub fn classifier(&self) -> &RetryClassifier {
        &self.classifier
    }

    /// Runs one API request, retrying transient faults within `timeout`.
    pub async fn call<T, F, Fut>(&self, what: &str, timeout: Duration, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        tracing::debug!("{what}: sending request");
        let config = self.retry.for_timeout(timeout);
        let result = execute_with_retry(
            operation,
            &self.classifier,
            &config,
            &self.cancel,
            |status: RetryStatus| {
                tracing::debug!(
                    attempt = status.attempt,
                    sleep_ms = status.sleep.as_millis() as u64,
                    rate_limited = status.is_rate_limit,
                    "{what}: retrying ({})",
                    status.reason
                );
            },
        )
        .await;
        Ok(result?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("customer_id", &self.customer_id)
            .field("retry", &self.retry)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}
