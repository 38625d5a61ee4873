use gworkspace_provider::ResourceData;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{attrs, provider_for};

const TYPE: &str = "googleworkspace_user_delegate";
const DELEGATES: &str = "/gmail/v1/users/alice%40example.com/settings/delegates";
const DELEGATE: &str = "/gmail/v1/users/alice%40example.com/settings/delegates/bob%40example.com";

async fn mount_get(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
        .and(path(DELEGATE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delegateEmail": "bob@example.com",
            "verificationStatus": status
        })))
        .mount(server)
        .await;
}

fn existing_state() -> ResourceData {
    ResourceData::from_state(
        "alice@example.com:bob@example.com",
        attrs(json!({
            "user_id": "alice@example.com",
            "delegate_email": "bob@example.com",
            "delegate_verification_status": "accepted",
        })),
    )
}

#[tokio::test]
async fn create_builds_composite_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DELEGATES))
        .and(body_partial_json(json!({"delegateEmail": "bob@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "delegateEmail": "bob@example.com",
            "verificationStatus": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "pending").await;

    let provider = provider_for(&server);
    let mut data = ResourceData::from_values(attrs(json!({
        "user_id": "alice@example.com",
        "delegate_email": "bob@example.com",
    })));

    let diags = provider.create(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.id(), Some("alice@example.com:bob@example.com"));
    assert_eq!(data.get_str("delegate_verification_status"), Some("pending"));
}

#[tokio::test]
async fn read_refreshes_verification_status() {
    let server = MockServer::start().await;
    mount_get(&server, "accepted").await;

    let provider = provider_for(&server);
    let mut data = existing_state();
    data.set("delegate_verification_status", "pending");

    let diags = provider.read(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.get_str("delegate_verification_status"), Some("accepted"));
}

#[tokio::test]
async fn delete_removes_state() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(DELEGATE))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = existing_state();

    let diags = provider.delete(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.id(), None);
}

#[tokio::test]
async fn read_of_revoked_delegate_clears_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DELEGATE))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = existing_state();

    let diags = provider.read(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.id(), None);
}

#[tokio::test]
async fn import_reads_both_parts() {
    let server = MockServer::start().await;
    mount_get(&server, "accepted").await;

    let provider = provider_for(&server);
    let data = provider
        .import(TYPE, "alice@example.com:bob@example.com")
        .await
        .unwrap();

    assert_eq!(data.get_str("user_id"), Some("alice@example.com"));
    assert_eq!(data.get_str("delegate_email"), Some("bob@example.com"));
    assert_eq!(data.get_str("delegate_verification_status"), Some("accepted"));
}

#[tokio::test]
async fn import_rejects_malformed_id() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);

    let diags = provider.import(TYPE, "alice@example.com").await.unwrap_err();

    let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap();
    assert_eq!(
        summary,
        r#"Unexpected format of ID ("alice@example.com"), expected user_id:delegate_email"#
    );
}

#[tokio::test]
async fn changing_user_requires_replacement() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);
    let mut data = existing_state();
    data.plan("user_id", "carol@example.com");

    let diags = provider.update(TYPE, &mut data).await;

    assert!(diags.has_error());
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.summary, "Attribute change requires replacement");
    assert_eq!(diag.attribute.as_deref(), Some("user_id"));
}
