//! Integration tests for catalog calls, presets and client configuration.

use std::collections::HashMap;

use fluent_rest::rest::build_path;
use fluent_rest::{
    ClientConfig, Credentials, HttpError, HttpMethod, InvalidHttpRequestError, MethodDefinition,
    RateLimitPreset, RequestOptions, ResourceCatalog, ResourceDefinition, RestClient,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG: &str = r#"{
    "repos": {
        "basePath": "repos",
        "methods": {
            "get": { "path": "{owner}/{repo}" },
            "createIssue": { "path": "{owner}/{repo}/issues", "method": "POST" },
            "delete": { "path": "{owner}/{repo}", "method": "delete" }
        }
    },
    "user": {
        "basePath": "user",
        "methods": { "get": {} }
    }
}"#;

fn create_catalog_client(server: &MockServer) -> RestClient {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .credentials(Credentials::bearer("ghp_test").unwrap())
        .rate_limit(RateLimitPreset::GitHub)
        .build()
        .unwrap();
    RestClient::new(&config)
        .unwrap()
        .with_catalog(ResourceCatalog::from_json(CATALOG).unwrap())
}

// ============================================================================
// Catalog Calls
// ============================================================================

#[tokio::test]
async fn test_call_interpolates_path_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"full_name": "octocat/hello-world"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_catalog_client(&server);
    let repo: Value = client
        .call(
            "repos",
            "get",
            [("owner", "octocat"), ("repo", "hello-world")],
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(repo["full_name"], "octocat/hello-world");
}

#[tokio::test]
async fn test_call_uses_declared_verb_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/octocat/hello/issues"))
        .and(body_json(json!({"title": "Found a bug"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"number": 1347})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_catalog_client(&server);
    let issue: Value = client
        .call(
            "repos",
            "createIssue",
            [("owner", "octocat"), ("repo", "hello")],
            RequestOptions::new().body(json!({"title": "Found a bug"})),
        )
        .await
        .unwrap();

    assert_eq!(issue["number"], 1347);
}

#[tokio::test]
async fn test_call_method_without_path_uses_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_catalog_client(&server);
    let user: Value = client
        .call("user", "get", Vec::<(String, String)>::new(), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(user["login"], "octocat");
}

#[tokio::test]
async fn test_call_with_missing_parameter_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_catalog_client(&server);
    let error = client
        .call::<Value, _, _, _>("repos", "get", [("owner", "octocat")], RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        HttpError::InvalidRequest(InvalidHttpRequestError::MissingPathParameter { ref name, .. })
            if name == "repo"
    ));
}

#[tokio::test]
async fn test_call_unknown_resource() {
    let server = MockServer::start().await;
    let client = create_catalog_client(&server);

    let error = client
        .call::<Value, _, _, _>("gists", "list", Vec::<(String, String)>::new(), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        HttpError::InvalidRequest(InvalidHttpRequestError::UnknownResource { .. })
    ));
}

// ============================================================================
// Catalog Construction
// ============================================================================

#[test]
fn test_catalog_from_builder_matches_json() {
    let built = ResourceCatalog::new()
        .resource(
            "repos",
            ResourceDefinition::new("repos")
                .method("get", MethodDefinition::new("{owner}/{repo}"))
                .method(
                    "createIssue",
                    MethodDefinition::new("{owner}/{repo}/issues").with_method(HttpMethod::Post),
                )
                .method(
                    "delete",
                    MethodDefinition::new("{owner}/{repo}").with_method(HttpMethod::Delete),
                ),
        )
        .resource(
            "user",
            ResourceDefinition::new("user").method("get", MethodDefinition::new("")),
        );

    assert_eq!(built, ResourceCatalog::from_json(CATALOG).unwrap());
}

#[test]
fn test_build_path_encodes_values() {
    let mut args = HashMap::new();
    args.insert("id".to_string(), "a/b".to_string());
    assert_eq!(build_path("projects/{id}", &args).unwrap(), "projects/a%2Fb");
}

// ============================================================================
// Presets and Configuration
// ============================================================================

#[tokio::test]
async fn test_preset_sets_client_budget() {
    let server = MockServer::start().await;
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .rate_limit("spotify".parse::<RateLimitPreset>().unwrap())
        .build()
        .unwrap();
    let client = RestClient::new(&config).unwrap();

    let info = client.rate_limit_info();
    assert_eq!(info.limit, 180);
    assert_eq!(info.remaining, 180);
}

#[tokio::test]
async fn test_user_agent_prefix_is_sent() {
    let server = MockServer::start().await;
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .user_agent_prefix("my-app")
        .build()
        .unwrap();
    let client = RestClient::new(&config).unwrap();

    let user_agent = client.executor().default_headers()["User-Agent"].clone();
    assert!(user_agent.starts_with("my-app | fluent-rest v"));

    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("user-agent", user_agent.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let _: Value = client.path("ping").get(RequestOptions::new()).await.unwrap();
}

#[test]
fn test_builder_requires_base_url() {
    let result = ClientConfig::builder().build();
    assert!(result.is_err());
}
