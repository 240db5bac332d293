use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use nukible_api::models::LockStateCode;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::mock_app::{MockApp, TEST_PIN, TEST_TOKEN};

#[tokio::test]
async fn test_lock_action_drives_the_device() {
    let app = MockApp::new().await;

    let request = Request::builder()
        .uri(format!("/lockAction?token={TEST_TOKEN}&nukiId=1a2b3c&action=2"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"success":true,"batteryCritical":false}"#
    );

    assert_eq!(app.sim_lock().last_action(), Some(2));
    assert_eq!(app.sim_lock().lock_state(), LockStateCode::Locked);
}

#[tokio::test]
async fn test_lock_and_unlock_round_trip() {
    let app = MockApp::new().await;

    let request = Request::builder()
        .uri(format!("/lock?token={TEST_TOKEN}&nukiId=1a2b3c"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.sim_lock().lock_state(), LockStateCode::Locked);

    let request = Request::builder()
        .uri(format!("/unlock?token={TEST_TOKEN}&nukiId=1a2b3c"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let ack: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ack["success"], json!(true));
    assert_eq!(app.sim_lock().lock_state(), LockStateCode::Unlocked);
}

#[tokio::test]
async fn test_command_response_reports_battery_state() {
    let app = MockApp::new().await;
    app.sim_lock().set_battery(true, false, 9);
    app.device().await.refresh().await.unwrap();

    let request = Request::builder()
        .uri(format!("/lock?token={TEST_TOKEN}&nukiId=1a2b3c"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let ack: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(ack["success"], json!(true));
    assert_eq!(ack["batteryCritical"], json!(true));
}

#[tokio::test]
async fn test_device_rejections_keep_http_200() {
    let app = MockApp::new().await;

    // Action code the device does not know
    let request = Request::builder()
        .uri(format!(
            "/lockAction?token={TEST_TOKEN}&nukiId=1a2b3c&action=99"
        ))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"success":false,"error_code":"K_ERROR_BAD_PARAMETER"}"#
    );

    // Device-reported rejection of an otherwise valid command
    app.sim_lock().reject_commands("K_ERROR_MOTOR_BLOCKED");

    let request = Request::builder()
        .uri(format!("/lock?token={TEST_TOKEN}&nukiId=1a2b3c"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let rejection: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rejection["success"], json!(false));
    assert_eq!(rejection["error_code"], json!("K_ERROR_MOTOR_BLOCKED"));
}

#[tokio::test]
async fn test_verify_security_pin() {
    let app = MockApp::new().await;

    let request = Request::builder()
        .uri(format!(
            "/verify_security_pin?token={TEST_TOKEN}&nukiId=1a2b3c&pin={TEST_PIN}"
        ))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let ack: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ack, json!({ "success": true }));

    // Wrong PIN: rejected by the device, still HTTP 200
    let request = Request::builder()
        .uri(format!(
            "/verify_security_pin?token={TEST_TOKEN}&nukiId=1a2b3c&pin=9999"
        ))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let rejection: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rejection["success"], json!(false));
    assert_eq!(rejection["error_code"], json!("K_ERROR_BAD_PIN"));
}

#[tokio::test]
async fn test_request_log_entries() {
    let app = MockApp::new().await;

    // Put one lock action into the log first
    let request = Request::builder()
        .uri(format!("/lock?token={TEST_TOKEN}&nukiId=1a2b3c"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap();

    // Default window is the single newest entry
    let request = Request::builder()
        .uri(format!(
            "/request_log_entries?token={TEST_TOKEN}&nukiId=1a2b3c&security_pin={TEST_PIN}"
        ))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], json!("LOCK_ACTION"));
    assert_eq!(entries[0]["index"], json!(1));
    assert_eq!(entries[0]["auth_id"], json!("2b"));
    assert_eq!(entries[0]["data"]["lock_action"], json!(2));

    // A wider window reaches back to the oldest entry, whose absent fields
    // render as empty strings
    let request = Request::builder()
        .uri(format!(
            "/request_log_entries?token={TEST_TOKEN}&nukiId=1a2b3c&security_pin={TEST_PIN}&count=10"
        ))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["type"], json!("LOGGING_ENABLED"));
    assert_eq!(entries[1]["timestamp"], json!(""));
    assert_eq!(entries[1]["auth_id"], json!(""));

    // start_index skips the newest entries
    let request = Request::builder()
        .uri(format!(
            "/request_log_entries?token={TEST_TOKEN}&nukiId=1a2b3c&security_pin={TEST_PIN}&count=10&start_index=1"
        ))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], json!("LOGGING_ENABLED"));

    // The log is PIN protected
    let request = Request::builder()
        .uri(format!(
            "/request_log_entries?token={TEST_TOKEN}&nukiId=1a2b3c&security_pin=9999"
        ))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let rejection: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rejection["success"], json!(false));
    assert_eq!(rejection["error_code"], json!("K_ERROR_BAD_PIN"));
}

#[tokio::test]
async fn test_unreachable_device_is_an_internal_error() {
    let app = MockApp::new().await;
    app.sim_lock().make_unreachable();

    let request = Request::builder()
        .uri(format!("/lock?token={TEST_TOKEN}&nukiId=1a2b3c"))
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(error["error"]["code"], json!(500));
    assert_eq!(error["error"]["message"], json!("Internal server error"));
    assert!(error["error"]["error_id"].is_string());
}
