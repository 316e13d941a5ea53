#![allow(clippy::unwrap_used)]
// Integration tests for `DoorClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use petflap_api::{DoorClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DoorClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = DoorClient::with_client(
        reqwest::Client::new(),
        base_url,
        "owner@example.com",
        secrecy::SecretString::from("test-password".to_string()),
    );
    (server, client)
}

// ── Identity tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_device_info() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Backdoor",
            "id": 4711,
            "sw_version": "1.4.2",
            "serial": "PW-0012-3456"
        })))
        .mount(&server)
        .await;

    let info = client.device_info().await.unwrap();

    assert_eq!(info.name, "Backdoor");
    assert_eq!(info.id, 4711);
    assert_eq!(info.sw_version, "1.4.2");
    assert_eq!(info.serial, "PW-0012-3456");
}

#[tokio::test]
async fn test_device_info_rejected_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/info"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.device_info().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── State tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_states() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "states": { "door": false, "rfid": true, "motion_in": true }
        })))
        .mount(&server)
        .await;

    let states = client.states().await.unwrap();

    assert_eq!(states.len(), 3);
    assert_eq!(states.get("door"), Some(&false));
    assert_eq!(states.get("rfid"), Some(&true));
}

#[tokio::test]
async fn test_states_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/states"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let result = client.states().await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => {
            assert!(body.contains("busy"), "raw body should be preserved");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_set_state() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/states/door"))
        .and(body_json(json!({ "value": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    client.set_state("door", true).await.unwrap();
}

#[tokio::test]
async fn test_set_state_device_error_with_http_200() {
    let (server, client) = setup().await;

    // The door reports some failures inside the envelope with HTTP 200.
    Mock::given(method("PUT"))
        .and(path("/api/v1/states/door"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": 503, "message": "motor busy" }
        })))
        .mount(&server)
        .await;

    let result = client.set_state("door", false).await;

    match result {
        Err(Error::Device { code, ref message }) => {
            assert_eq!(code, 503);
            assert_eq!(message, "motor busy");
        }
        other => panic!("expected Device error, got: {other:?}"),
    }
}

// ── Pet tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_pets_include_all() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pets"))
        .and(query_param("include_all", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pets": [
                { "id": "pet-1", "name": "Miezi", "species": "cat" },
                { "id": "pet-2", "name": "Rex", "species": "dog" },
                { "id": "pet-3", "name": null, "species": null }
            ]
        })))
        .mount(&server)
        .await;

    let pets = client.pets(true).await.unwrap();

    assert_eq!(pets.len(), 3);
    assert_eq!(pets[0].id, "pet-1");
    assert_eq!(pets[0].name.as_deref(), Some("Miezi"));
    assert_eq!(pets[1].species.as_deref(), Some("dog"));
    assert!(pets[2].name.is_none());
}

#[tokio::test]
async fn test_pet_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/4711/pet-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {
                "pet-1": { "direction": "in", "ts": "2025-06-15T10:30:00Z" },
                "pet-2": { "direction": "out", "ts": "2025-06-15T09:00:00Z" }
            }
        })))
        .mount(&server)
        .await;

    let status = client.pet_status(4711).await.unwrap();

    assert_eq!(status.len(), 2);
    assert_eq!(status.get("pet-1").unwrap().direction, "in");
    assert_eq!(status.get("pet-2").unwrap().direction, "out");
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_plain_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/states"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let result = client.states().await;

    match result {
        Err(Error::Device { code, ref message }) => {
            assert_eq!(code, 500);
            assert!(message.contains("internal error"));
        }
        other => panic!("expected Device error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    // Point at a closed port -- no server.
    let base_url = Url::parse("http://127.0.0.1:9").unwrap();
    let client = DoorClient::with_client(
        reqwest::Client::new(),
        base_url,
        "owner@example.com",
        secrecy::SecretString::from("pw".to_string()),
    );

    let result = client.device_info().await;

    match result {
        Err(e) => {
            assert!(matches!(e, Error::Transport(_)), "got: {e:?}");
            assert!(e.is_transient());
        }
        Ok(info) => panic!("expected Transport error, got: {info:?}"),
    }
}
