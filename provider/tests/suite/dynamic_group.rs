use gworkspace_provider::ResourceData;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{DISCUSSION_FORUM, attrs, error_json, group_json, operation_json, provider_for};

const TYPE: &str = "googleworkspace_dynamic_group";
const QUERY: &str = "user.organizations.exists(org, org.department=='engineering')";

fn existing_state() -> ResourceData {
    ResourceData::from_state(
        "groups/01abc",
        attrs(json!({
            "email": "eng@example.com",
            "name": "Engineering",
            "query": QUERY,
            "description": "",
            "labels": {DISCUSSION_FORUM: ""},
        })),
    )
}

async fn mount_get(server: &MockServer, email: &str, display_name: &str, query: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/groups/01abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_json(
            "groups/01abc",
            email,
            display_name,
            query,
        )))
        .mount(server)
        .await;
}

#[tokio::test]
async fn create_sets_id_from_operation_and_reads_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/groups"))
        .and(query_param("initialGroupConfig", "EMPTY"))
        .and(body_partial_json(json!({
            "groupKey": {"id": "eng@example.com"},
            "parent": "customerId/C01abcde",
            "labels": {DISCUSSION_FORUM: ""},
            "dynamicGroupMetadata": {"queries": [{"resourceType": "USER", "query": QUERY}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_json("groups/01abc")))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "eng@example.com", "eng@example.com", QUERY).await;

    let provider = provider_for(&server);
    let mut data = ResourceData::from_values(attrs(json!({
        "email": "eng@example.com",
        "query": QUERY,
    })));

    let diags = provider.create(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.id(), Some("groups/01abc"));
    assert_eq!(data.get_str("name"), Some("eng@example.com"));
    assert_eq!(data.get_str("query"), Some(QUERY));
    assert_eq!(data.get("labels"), Some(&json!({DISCUSSION_FORUM: ""})));
}

#[tokio::test]
async fn create_rejects_invalid_config_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = ResourceData::from_values(attrs(json!({
        "email": "eng@example.com",
        "description": "x".repeat(4097),
    })));

    let diags = provider.create(TYPE, &mut data).await;

    let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
    assert_eq!(
        summaries,
        vec!["Invalid attribute value", "Missing required argument"]
    );
}

#[tokio::test]
async fn read_of_deleted_group_clears_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/01abc"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(error_json(404, "Resource not found", "notFound")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = existing_state();

    let diags = provider.read(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.id(), None);
}

#[tokio::test]
async fn read_surfaces_other_errors_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/groups/01abc"))
        .respond_with(ResponseTemplate::new(400).set_body_string("malformed name"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = existing_state();

    let diags = provider.read(TYPE, &mut data).await;

    assert!(diags.has_error());
    assert_eq!(data.id(), Some("groups/01abc"));
    let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap();
    assert_eq!(
        summary,
        "Error when reading or editing eng@example.com: googleapi: got HTTP response code 400 with body: malformed name"
    );
}

#[tokio::test]
async fn update_patches_changed_fields_only() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/groups/01abc"))
        .and(query_param("updateMask", "displayName,description"))
        .and(body_partial_json(json!({
            "displayName": "Platform Engineering",
            "description": "Everyone in engineering"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation_json("groups/01abc")))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "eng@example.com", "Platform Engineering", QUERY).await;

    let provider = provider_for(&server);
    let mut data = existing_state();
    data.plan("name", "Platform Engineering");
    data.plan("description", "Everyone in engineering");

    let diags = provider.update(TYPE, &mut data).await;

    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(data.get_str("name"), Some("Platform Engineering"));
}

#[tokio::test]
async fn update_refuses_email_change_mixed_with_others() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = existing_state();
    data.plan("email", "platform@example.com");
    data.plan("name", "Platform");

    let diags = provider.update(TYPE, &mut data).await;

    let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap();
    assert_eq!(
        summary,
        "If you change the email address of a group, you must only change the email address."
    );
}

#[tokio::test]
async fn update_refuses_query_change_mixed_with_others() {
    let server = MockServer::start().await;
    let provider = provider_for(&server);
    let mut data = existing_state();
    data.plan("query", "user.is_enrolled_in_2sv");
    data.plan("description", "2SV users");

    let diags = provider.update(TYPE, &mut data).await;

    let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap();
    assert_eq!(
        summary,
        "If you change the query of a group, you must only change the query."
    );
}

#[tokio::test]
async fn update_without_changes_only_reads() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_get(&server, "eng@example.com", "Engineering", QUERY).await;

    let provider = provider_for(&server);
    let mut data = existing_state();

    let diags = provider.update(TYPE, &mut data).await;
    assert!(diags.is_empty(), "{diags:?}");
}

#[tokio::test]
async fn delete_of_missing_group_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/groups/01abc"))
        .respond_with(ResponseTemplate::new(404))
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
async fn import_passes_id_through() {
    let server = MockServer::start().await;
    mount_get(&server, "eng@example.com", "Engineering", QUERY).await;

    let provider = provider_for(&server);
    let data = provider.import(TYPE, "groups/01abc").await.unwrap();

    assert_eq!(data.id(), Some("groups/01abc"));
    assert_eq!(data.get_str("email"), Some("eng@example.com"));
}

#[tokio::test]
async fn import_rejects_urls_without_calling_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    for id in ["https://attacker.example/steal", "//attacker.example/x", "01abc"] {
        let diags = provider.import(TYPE, id).await.unwrap_err();
        let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap_or_default();
        assert_eq!(
            summary,
            format!("Unexpected format of ID ({id:?}), expected groups/<id>")
        );
    }
}

#[tokio::test]
async fn delete_failure_names_the_group_email() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/groups/01abc"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_json(400, "bad request", "badRequest")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut data = existing_state();

    let diags = provider.delete(TYPE, &mut data).await;

    assert!(diags.has_error());
    assert_eq!(data.id(), Some("groups/01abc"));
    let summary = diags.iter().next().map(|d| d.summary.clone()).unwrap_or_default();
    assert!(
        summary.starts_with("Error when reading or editing eng@example.com: "),
        "{summary}"
    );
}
