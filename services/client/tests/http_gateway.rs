//! services/client/tests/http_gateway.rs
//!
//! Exercises `HttpGateway` against a mock story API and geocoder.

use client_lib::adapters::HttpGateway;
use reqwest::Client;
use serde_json::json;
use storyhub_core::{
    GeoPoint, LocationFilter, NewStory, Photo, PortError, RemoteGateway, StoryQuery,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok-123";

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(Client::new(), server.uri(), server.uri(), "storyhub-test")
}

#[tokio::test]
async fn list_sends_paging_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories"))
        .and(query_param("page", "2"))
        .and(query_param("size", "5"))
        .and(query_param("location", "1"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "message": "Stories fetched successfully",
            "listStory": [
                {
                    "id": "s1",
                    "name": "Alice",
                    "description": "hi",
                    "photoUrl": "https://img/s1.jpg",
                    "createdAt": "2024-01-01",
                    "lat": -6.2,
                    "lon": 106.8166
                },
                {
                    "id": "s2",
                    "name": "Bob",
                    "description": "there",
                    "photoUrl": "https://img/s2.jpg",
                    "createdAt": "2024-01-02T08:30:00.000Z",
                    "lat": null,
                    "lon": null
                }
            ],
            "totalStories": 40
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = StoryQuery {
        page: 2,
        size: 5,
        location: LocationFilter::WithLocation,
    };
    let page = gateway(&server).list_stories(TOKEN, &query).await.unwrap();

    assert_eq!(page.total, 40);
    assert_eq!(page.stories.len(), 2);
    assert_eq!(page.stories[0].id, "s1");
    assert_eq!(
        page.stories[0].location,
        Some(GeoPoint {
            lat: -6.2,
            lon: 106.8166
        })
    );
    assert_eq!(page.stories[0].created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert_eq!(page.stories[1].location, None);
}

#[tokio::test]
async fn missing_total_counts_the_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "listStory": [
                { "id": "s1", "name": "Alice", "description": "hi", "createdAt": "2024-01-01" }
            ]
        })))
        .mount(&server)
        .await;

    let page = gateway(&server)
        .list_stories(TOKEN, &StoryQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn detail_fetches_a_single_story() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories/story-abc"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "message": "Story fetched successfully",
            "story": {
                "id": "story-abc",
                "name": "Carol",
                "description": "sunset",
                "photoUrl": "https://img/abc.jpg",
                "createdAt": "2024-03-10T17:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let story = gateway(&server).get_story("story-abc", TOKEN).await.unwrap();
    assert_eq!(story.name, "Carol");
    assert_eq!(story.location, None);
}

#[tokio::test]
async fn server_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": true,
            "message": "Missing authentication"
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .list_stories(TOKEN, &StoryQuery::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PortError::Api {
            status: 401,
            message: "Missing authentication".to_string()
        }
    );
    assert_eq!(err.to_string(), "Missing authentication");
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stories": [] })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .list_stories(TOKEN, &StoryQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let gateway = HttpGateway::new(
        Client::new(),
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
        "storyhub-test",
    );
    let err = gateway
        .list_stories(TOKEN, &StoryQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Network(_)), "got {err:?}");
    assert!(err.triggers_fallback());
}

#[tokio::test]
async fn login_and_register_post_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("\"email\":\"alice@example.com\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "message": "success",
            "loginResult": { "userId": "user-1", "name": "Alice", "token": "tok-xyz" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_string_contains("\"name\":\"Alice\""))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "error": false, "message": "User created" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let message = gateway
        .register("Alice", "alice@example.com", "secret123")
        .await
        .unwrap();
    assert_eq!(message, "User created");

    let outcome = gateway.login("alice@example.com", "secret123").await.unwrap();
    assert_eq!(outcome.user_id, "user-1");
    assert_eq!(outcome.name, "Alice");
    assert_eq!(outcome.token, "tok-xyz");
}

#[tokio::test]
async fn submit_sends_multipart_with_photo_and_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stories"))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_string_contains("name=\"description\""))
        .and(body_string_contains("a day at the beach"))
        .and(body_string_contains("name=\"lat\""))
        .and(body_string_contains("filename=\"captured.jpg\""))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "error": false, "message": "Story created successfully" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let story = NewStory {
        description: "a day at the beach".to_string(),
        location: Some(GeoPoint {
            lat: -8.65,
            lon: 115.2167,
        }),
        photo: Some(Photo::captured(b"jpeg-bytes".to_vec())),
    };
    let receipt = gateway(&server).submit_story(&story, TOKEN).await.unwrap();
    assert_eq!(receipt.message, "Story created successfully");
}

#[tokio::test]
async fn reverse_geocoding_resolves_display_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(header("user-agent", "storyhub-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "Kuta, Badung, Bali, Indonesia"
        })))
        .mount(&server)
        .await;

    let location = gateway(&server).resolve_address(-8.72, 115.17).await;
    assert!(location.resolved);
    assert_eq!(location.address, "Kuta, Badung, Bali, Indonesia");
    assert_eq!(location.coordinates, "-8.7200, 115.1700");
}

#[tokio::test]
async fn geocoder_rejection_and_outage_yield_placeholders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let rejected = gateway(&server).resolve_address(1.0, 2.0).await;
    assert!(!rejected.resolved);
    assert_eq!(rejected.address, "Location details unavailable offline");
    assert_eq!(rejected.coordinates, "1.0000, 2.0000 (cached)");

    let unreachable = HttpGateway::new(
        Client::new(),
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
        "storyhub-test",
    );
    let failed = unreachable.resolve_address(1.0, 2.0).await;
    assert!(!failed.resolved);
    assert_eq!(failed.address, "Failed to load location details");
    assert_eq!(failed.coordinates, "1.0000, 2.0000");
}

#[tokio::test]
async fn unreadable_list_record_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "listStory": [
                { "id": "bad", "name": "Eve", "description": "?", "createdAt": "last tuesday" },
                { "id": "s2", "name": "Bob", "description": "ok", "createdAt": "2024-01-02" }
            ],
            "totalStories": 2
        })))
        .mount(&server)
        .await;

    let page = gateway(&server)
        .list_stories(TOKEN, &StoryQuery::default())
        .await
        .unwrap();
    assert_eq!(page.stories.len(), 1);
    assert_eq!(page.stories[0].id, "s2");
}

#[tokio::test]
async fn login_without_token_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": false,
            "message": "success",
            "loginResult": { "userId": "user-1", "name": "Alice", "token": "" }
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .login("alice@example.com", "secret123")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Decode(_)), "got {err:?}");
}
