//! Integration tests for endpoint calls

use super::*;
use integrations_netatmo::{params, ClientEvent, ErrorKind, Severity};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn authenticated_client(server: &MockServer) -> NetatmoClient {
    let client = client_for(server, Credentials::from_token("T"));
    client.authenticate().await.unwrap();
    client
}

#[tokio::test]
async fn test_get_measure_sends_normalized_query_with_bearer() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/getmeasure"))
        .and(header("authorization", "Bearer T"))
        .and(query_param("device_id", "70:ee:50:00:00:01"))
        .and(query_param("scale", "30min"))
        .and(query_param("type", "temperature,humidity"))
        .and(query_param("date_begin", "1700000000"))
        .and(query_param("date_end", "last"))
        .and(query_param("limit", "1024"))
        .and(query_param("optimize", "true"))
        .respond_with(envelope(json!([{"beg_time": 1700000000, "value": [[21.5, 40]]}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;

    let body = client
        .weather()
        .get_measure(Some(params([
            ("device_id", json!("70:ee:50:00:00:01")),
            ("scale", json!("30min")),
            ("type", json!(["Temperature", "Humidity"])),
            ("date_begin", json!(1700000000000u64)),
            ("date_end", json!("last")),
            ("limit", json!(5000)),
            ("optimize", json!(1)),
        ])))
        .await
        .unwrap();

    assert_eq!(body[0]["beg_time"], json!(1700000000));
}

#[tokio::test]
async fn test_post_sends_access_token_in_form() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/setroomthermpoint"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("home_id=h1"))
        .and(body_string_contains("room_id=r1"))
        .and(body_string_contains("mode=manual"))
        .and(body_string_contains("temp=19.5"))
        .and(body_string_contains("access_token=T"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "time_server": 1700000000})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;

    let result = client
        .energy()
        .set_room_therm_point(Some(params([
            ("home_id", json!("h1")),
            ("room_id", json!("r1")),
            ("mode", json!("manual")),
            ("temp", json!(19.5)),
        ])))
        .await
        .unwrap();

    assert_eq!(result["status"], json!("ok"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_response_event_is_broadcast() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/gethomecoachsdata"))
        .respond_with(envelope(json!({"devices": []})))
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;
    let mut events = client.subscribe();

    client.aircare().get_home_coachs_data(None).await.unwrap();

    match events.recv().await.unwrap() {
        ClientEvent::Response { label, body } => {
            assert_eq!(label, "get-homecoachesdata");
            assert_eq!(body, json!({"devices": []}));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_json_error_message_is_surfaced() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/homestatus"))
        .respond_with(error_response(
            403,
            json!({"error": {"code": 3, "message": "Invalid token"}}),
        ))
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;
    let mut events = client.subscribe();

    let error = client
        .energy()
        .home_status(Some(params([("home_id", json!("h1"))])))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Auth);
    assert_eq!(error.severity, Severity::Warning);
    assert_eq!(error.status, Some(403));
    assert!(error.message.ends_with("Invalid token"));
    assert!(matches!(events.recv().await.unwrap(), ClientEvent::Warning(_)));
}

#[tokio::test]
async fn test_non_json_error_uses_status_code() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/gethomedata"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>Internal Server Error</html>"),
        )
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;

    let error = client.security().get_home_data(None).await.unwrap_err();

    assert_eq!(error.kind, ErrorKind::Http);
    assert_eq!(error.message, "getHomeData error: Status code 500");
}

#[tokio::test]
async fn test_error_without_content_type() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/getnextevents"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;

    let error = client
        .security()
        .get_next_events(Some(params([("home_id", json!("h")), ("event_id", json!("e"))])))
        .await
        .unwrap_err();

    assert_eq!(error.message, "getNextEvents error: Status code 502");
}

#[tokio::test]
async fn test_camera_picture_returns_bytes() {
    let server = setup_mock_server().await;
    let jpeg = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];

    Mock::given(method("GET"))
        .and(path("/api/getcamerapicture"))
        .and(query_param("image_id", "img"))
        .and(query_param("key", "k"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(jpeg.clone()),
        )
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;

    let bytes = client
        .security()
        .get_camera_picture(Some(params([("image_id", json!("img")), ("key", json!("k"))])))
        .await
        .unwrap();

    assert_eq!(bytes, jpeg);
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/api/addwebhook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = authenticated_client(&server).await;

    let error = client.security().add_webhook(None).await.unwrap_err();

    assert_eq!(error.kind, ErrorKind::Validation);
    assert_eq!(error.message, "addWebHook 'options' not set.");
}

#[tokio::test]
async fn test_oversized_response_is_rejected() {
    let server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/api/getcamerapicture"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0u8; 4096]),
        )
        .mount(&server)
        .await;

    let config = NetatmoConfig::builder()
        .base_url(server.uri())
        .max_response_size(1024)
        .build()
        .unwrap();
    let client = NetatmoClient::builder()
        .config(config)
        .credentials(Credentials::from_token("T"))
        .build()
        .unwrap();
    client.authenticate().await.unwrap();

    let error = client
        .security()
        .get_camera_picture(Some(params([("image_id", json!("img")), ("key", json!("k"))])))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Http);
    assert_eq!(error.status, None);
    assert_eq!(error.message, "getCameraPicture error: Response exceeds 1024 bytes");
}
