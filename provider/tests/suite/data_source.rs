use gworkspace_provider::config::{CLOUD_IDENTITY_GROUPS_SCOPE, GMAIL_SETTINGS_SHARING_SCOPE};
use gworkspace_provider::{ApiClient, Provider, ResourceData};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{attrs, config_for, group_json, provider_for};

const TYPE: &str = "googleworkspace_dynamic_group";

#[tokio::test]
async fn looks_up_group_by_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups:lookup"))
        .and(query_param("groupKey.id", "eng@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "groups/01abc"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/01abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(
            "groups/01abc",
            "eng@example.com",
            "Engineering",
            "user.is_enrolled_in_2sv",
        )))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = ResourceData::from_values(attrs(json!({"email": "eng@example.com"})));

    let diags = provider.read_data_source(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.id(), Some("groups/01abc"));
    assert_eq!(data.get_str("name"), Some("Engineering"));
    assert_eq!(data.get_str("query"), Some("user.is_enrolled_in_2sv"));
}

#[tokio::test]
async fn reads_group_by_id_without_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups:lookup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/01abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(
            "groups/01abc",
            "eng@example.com",
            "Engineering",
            "q",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = ResourceData::from_values(attrs(json!({"id": "groups/01abc"})));

    let diags = provider.read_data_source(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.get_str("email"), Some("eng@example.com"));
}

#[tokio::test]
async fn empty_lookup_result_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = ResourceData::from_values(attrs(json!({"email": "ghost@example.com"})));

    let diags = provider.read_data_source(TYPE, &mut data).await;

    let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap();
    assert_eq!(summary, "No dynamic group was returned for ghost@example.com.");
}

#[tokio::test]
async fn id_and_email_are_mutually_exclusive() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);
    let mut data = ResourceData::from_values(attrs(json!({
        "id": "groups/01abc",
        "email": "eng@example.com",
    })));

    let diags = provider.read_data_source(TYPE, &mut data).await;

    let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap();
    assert_eq!(summary, "Invalid combination of arguments");
}

#[tokio::test]
async fn unknown_type_is_reported() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);
    assert_eq!(
        provider.resource_types().collect::<Vec<_>>(),
        vec!["googleworkspace_dynamic_group", "googleworkspace_user_delegate"]
    );
    assert_eq!(
        provider.data_source_types().collect::<Vec<_>>(),
        vec!["googleworkspace_dynamic_group"]
    );

    let mut data = ResourceData::new();
    let diags = provider.read_data_source("googleworkspace_user", &mut data).await;
    assert!(diags.has_error());
}

fn provider_with_scopes(server: &MockServer, scopes: &[&str]) -> Provider {
    let mut config = config_for(server);
    config.oauth_scopes = scopes.iter().map(|s| s.to_string()).collect();
    Provider::new(ApiClient::from_config(&config).unwrap())
}

#[tokio::test]
async fn missing_scope_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_with_scopes(&server, &[CLOUD_IDENTITY_GROUPS_SCOPE]);
    let mut data = ResourceData::from_state(
        "alice@example.com:bob@example.com",
        attrs(json!({"user_id": "alice@example.com", "delegate_email": "bob@example.com"})),
    );
    let diags = provider.read("googleworkspace_user_delegate", &mut data).await;
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.summary, "Missing OAuth scope");
    assert_eq!(
        diag.detail.as_deref(),
        Some(
            "googleworkspace_user_delegate requires the \"https://www.googleapis.com/auth/gmail.settings.sharing\" scope; add it to oauth_scopes."
        )
    );
    assert_eq!(data.id(), Some("alice@example.com:bob@example.com"));

    let provider = provider_with_scopes(&server, &[GMAIL_SETTINGS_SHARING_SCOPE]);
    let mut data = ResourceData::from_values(attrs(json!({"email": "eng@example.com"})));
    let diags = provider.read_data_source(TYPE, &mut data).await;
    assert!(diags.has_error());
    assert_eq!(
        diags.iter().next().map(|d| d.summary.as_str()),
        Some("Missing OAuth scope")
    );
}
