//! Drives the reqwest transport against a mock HTTP server.

use std::sync::Arc;

use httpmock::prelude::*;
use joogle_core::api::ApiClient;
use joogle_core::api::analytics::fetch_analytics;
use joogle_core::config::parse_base_url;
use joogle_core::models::auth::Principal;
use joogle_core::transport::HttpTransport;
use serde_json::json;

fn client(server: &MockServer) -> ApiClient {
    let base = parse_base_url("test", &server.base_url()).expect("base url");
    ApiClient::new(base, Arc::new(HttpTransport::new()))
}

fn principal() -> Principal {
    Principal::new("u-1", "ada@example.com", "s-1")
}

#[tokio::test]
async fn analytics_request_carries_scoped_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/domain/get_analytics")
                .query_param("domain", "example.com")
                .header_exists("authorization");
            then.status(200).json_body(json!({
                "domain": "example.com",
                "owned_by": "u-1",
                "created_at": "2024-03-01T10:00:00Z",
                "indexed_pages": [{
                    "url": "https://example.com/",
                    "domain": "example.com",
                    "title": "Home",
                    "description": "Landing page",
                    "ttr": 0.61,
                    "loc": "en"
                }]
            }));
        })
        .await;

    let analytics = fetch_analytics(&client(&server), Some(&principal()), b"secret", "example.com")
        .await
        .expect("analytics");

    mock.assert_async().await;
    assert_eq!(analytics.indexed_pages[0].title, "Home");
}

#[tokio::test]
async fn analytics_not_found_is_none() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/domain/get_analytics");
            then.status(404);
        })
        .await;

    let result = fetch_analytics(&client(&server), Some(&principal()), b"secret", "example.com").await;

    mock.assert_async().await;
    assert!(result.is_none());
}

#[tokio::test]
async fn ownership_handshake_over_http() {
    let server = MockServer::start_async().await;
    let key = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/domain/get_ownership")
                .query_param("domain", "example.com")
                .query_param("uid", "u-1");
            then.status(200).json_body(json!({
                "for_domain": "example.com",
                "for_user": "u-1",
                "txt_record_content": "joogleown:example.com>u-1"
            }));
        })
        .await;
    let check = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/domain/check_dns_record")
                .query_param("domain", "example.com")
                .query_param("uid", "u-1");
            then.status(200)
                .json_body(json!({ "ownership_verified": true, "queue_position": 2 }));
        })
        .await;

    let api = client(&server);
    let issued = api.get_ownership("example.com", "u-1").await.expect("key");
    let verified = api.check_dns_record("example.com", "u-1").await.expect("check");

    key.assert_async().await;
    check.assert_async().await;
    assert_eq!(issued.txt_record_content, "joogleown:example.com>u-1");
    assert!(verified.ownership_verified);
    assert_eq!(verified.queue_position, 2);
}

#[tokio::test]
async fn urls_are_posted_as_json() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/index/urls")
                .json_body(json!(["https://example.com/"]));
            then.status(200).body("<html></html>");
        })
        .await;

    client(&server)
        .queue_urls(&["https://example.com/".to_string()])
        .await
        .expect("queued");

    mock.assert_async().await;
}
