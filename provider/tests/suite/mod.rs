//! Integration tests driving the REST adapters and handlers against a mock API.

mod data_source;
mod dynamic_group;
mod user_delegate;

use gworkspace_provider::ApiClient;
use gworkspace_provider::Provider;
use gworkspace_provider::config::{EndpointsConfig, ProviderConfig, RetryConfig};
use serde_json::{Map, Value, json};
use wiremock::MockServer;

pub const CUSTOMER_ID: &str = "C01abcde";
pub const ACCESS_TOKEN: &str = "ya29.test-token";
pub const DISCUSSION_FORUM: &str = "cloudidentity.googleapis.com/groups.discussion_forum";

/// Config pointing both APIs at `server`, with millisecond backoff.
pub fn config_for(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        customer_id: CUSTOMER_ID.to_string(),
        access_token: Some(ACCESS_TOKEN.to_string()),
        endpoints: EndpointsConfig {
            cloud_identity: format!("{}/v1/", server.uri()),
            gmail: format!("{}/gmail/v1/", server.uri()),
        },
        retry: RetryConfig {
            max_attempts: Some(2),
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..ProviderConfig::default()
    }
}

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::from_config(&config_for(server)).expect("client builds")
}

pub fn provider_for(server: &MockServer) -> Provider {
    Provider::new(client_for(server))
}

/// JSON object literal as an attribute map.
pub fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn group_json(name: &str, email: &str, display_name: &str, query: &str) -> Value {
    json!({
        "name": name,
        "groupKey": {"id": email},
        "parent": format!("customerId/{CUSTOMER_ID}"),
        "displayName": display_name,
        "description": "",
        "labels": {DISCUSSION_FORUM: ""},
        "dynamicGroupMetadata": {
            "queries": [{"resourceType": "USER", "query": query}]
        }
    })
}

pub fn operation_json(name: &str) -> Value {
    json!({
        "done": true,
        "response": {
            "@type": "type.googleapis.com/google.apps.cloudidentity.groups.v1.Group",
            "name": name
        }
    })
}

pub fn error_json(code: u16, message: &str, reason: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{"message": message, "domain": "global", "reason": reason}]
        }
    })
}
