//! Integration tests for authentication and deferred calls

use super::*;
use integrations_netatmo::{ClientEvent, ErrorKind, SessionState, Severity};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_password_grant_authenticates() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=user%40example.com"))
        .and(body_string_contains("password=pa%20ss"))
        .and(body_string_contains("client_id=test-client"))
        .and(body_string_contains("client_secret=test-secret"))
        .and(body_string_contains("scope=read_station"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A",
            "refresh_token": "R",
            "expires_in": 10800,
            "scope": ["read_station"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, password_credentials());
    let mut events = client.subscribe();

    client.authenticate().await.unwrap();

    assert_eq!(client.state(), SessionState::Authenticated);
    assert_eq!(client.session().access_token().as_deref(), Some("A"));
    assert!(client.session().has_refresh_scheduled());
    assert!(matches!(events.recv().await.unwrap(), ClientEvent::Authenticated));
}

#[tokio::test]
async fn test_code_grant_forwards_redirect_uri() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A"})))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::builder()
        .client_id("test-client")
        .client_secret("test-secret")
        .code("the-code")
        .redirect_uri("https://app.example.com/cb")
        .build()
        .unwrap();
    let client = client_for(&server, credentials);

    client.authenticate().await.unwrap();
    assert_eq!(client.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(error_response(400, json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let client = client_for(&server, password_credentials());
    let mut events = client.subscribe();

    let error = client.authenticate().await.unwrap_err();

    assert_eq!(error.kind, ErrorKind::Auth);
    assert_eq!(error.severity, Severity::Critical);
    assert_eq!(error.status, Some(400));
    assert_eq!(error.message, "Authenticate error: invalid_grant");
    assert_eq!(client.state(), SessionState::Failed);
    assert!(matches!(events.recv().await.unwrap(), ClientEvent::Error(_)));
}

#[tokio::test]
async fn test_calls_made_before_authentication_complete() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A",
            "expires_in": 10800
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/getstationsdata"))
        .and(header("authorization", "Bearer A"))
        .respond_with(envelope(json!({"devices": [{"_id": "70:ee:50:00:00:01"}]})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/homesdata"))
        .and(header("authorization", "Bearer A"))
        .respond_with(envelope(json!({"homes": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, password_credentials());
    let weather = client.weather();
    let energy = client.energy();

    let stations = weather.get_stations_data(None);
    let homes = energy.homes_data(None);
    let auth = client.start();

    let (stations, homes) = tokio::join!(stations, homes);
    auth.await.unwrap().unwrap();

    assert_eq!(stations.unwrap()["devices"][0]["_id"], json!("70:ee:50:00:00:01"));
    assert_eq!(homes.unwrap(), json!({"homes": []}));
}

#[tokio::test]
async fn test_failed_authentication_fails_waiting_calls() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(error_response(
            403,
            json!({"error": {"code": 1, "message": "Access denied"}}),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server, password_credentials());
    let energy = client.energy();

    let call = energy.homes_data(None);
    let auth = client.start();

    let error = call.await.unwrap_err();
    assert!(auth.await.unwrap().is_err());

    assert_eq!(error.kind, ErrorKind::Auth);
    assert_eq!(error.message, "Authenticate error: Access denied");
}

#[tokio::test]
async fn test_preissued_token_sends_no_token_request() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::from_token("T"));
    client.authenticate().await.unwrap();

    assert_eq!(client.state(), SessionState::Authenticated);
    assert!(!client.session().has_refresh_scheduled());
}
