//! Vendor client operations against a mock vendor

mod common;

use common::{client_for, ringo_mock::sample_keys, MockRingoServer};
use pretty_assertions::assert_eq;
use ringo_bridge::client::models::{KeySpec, LockRef, ScheduleEntry, WeeklySchedule};
use ringo_bridge::lock::LockHandle;
use ringo_bridge::RingoError;
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use wiremock::{
    matchers::{body_json, method, path},
    Mock, ResponseTemplate,
};

#[tokio::test]
async fn test_empty_lock_list_is_not_an_error() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    mock.mock_locks(json!({"data": []}), Some(1)).await;

    let client = client_for(&mock.base_url);
    let locks = assert_ok!(client.get_locks().await);
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_malformed_lock_envelope_yields_empty_list() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    mock.mock_locks(json!({"message": "no locks"}), Some(1)).await;

    let client = client_for(&mock.base_url);
    assert_eq!(client.get_locks().await.unwrap(), vec![]);
}

#[tokio::test]
async fn test_users_without_envelope_yield_empty_list() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    mock.mock_users(json!({"data": null}), Some(1)).await;

    let client = client_for(&mock.base_url);
    assert!(client.get_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_digital_keys_parse_schedules() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    mock.mock_key_list(sample_keys(), Some(1)).await;

    let client = client_for(&mock.base_url);
    let keys = client.get_digital_keys().await.unwrap();

    assert_eq!(keys.len(), 3);
    assert!(!keys[0].is_usable());
    assert!(keys[1].is_usable());
    assert!(keys[1].grants(LockRef::new(1, 1)));
    assert!(keys[2].is_usable());
    assert!(matches!(keys[2].times[0], ScheduleEntry::Date(_)));
}

#[tokio::test]
async fn test_create_key_then_status_is_valid() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(Some(1)).await;
    mock.mock_create_key("KEY-NEW", Some(1)).await;
    mock.mock_key_status("KEY-NEW", true, Some(1)).await;

    let client = client_for(&mock.base_url);
    let spec = KeySpec {
        name: "Cleaner".to_string(),
        times: vec![ScheduleEntry::Schedule(WeeklySchedule {
            monday: Some(true.into()),
            start_time: Some("08:00".to_string()),
            end_time: Some("12:00".to_string()),
            ..Default::default()
        })],
        locks: vec![LockRef::new(1, 1)],
        use_pin: false,
        pins: vec![],
    };

    let created = client.create_key(&spec).await.unwrap();
    let digital_key = created["digital_key"].as_str().unwrap();

    let status = client.get_key_status(digital_key).await.unwrap();
    assert!(status.is_valid());
}

#[tokio::test]
async fn test_create_key_body_uses_integer_pin_flag() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    Mock::given(method("POST"))
        .and(path("/api/key"))
        .and(body_json(json!({
            "name": "Guest",
            "times": [{"type": "date", "start": 1, "end": 2}],
            "locks": [{"lock_id": 3, "relay_id": 4}],
            "use_pin": 1,
            "pins": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let client = client_for(&mock.base_url);
    let spec: KeySpec = KeySpec {
        name: "Guest".to_string(),
        times: vec![serde_json::from_value(json!({"type": "date", "start": 1, "end": 2})).unwrap()],
        locks: vec![LockRef::new(3, 4)],
        use_pin: true,
        pins: vec![],
    };
    client.create_key(&spec).await.unwrap();
}

#[tokio::test]
async fn test_update_and_delete_send_digital_key() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    Mock::given(method("PUT"))
        .and(path("/api/key"))
        .and(wiremock::matchers::body_partial_json(
            json!({"digital_key": "KEY-1", "name": "Renamed"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&mock.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/key"))
        .and(body_json(json!({"digital_key": "KEY-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let client = client_for(&mock.base_url);
    let spec = KeySpec {
        name: "Renamed".to_string(),
        times: vec![],
        locks: vec![],
        use_pin: false,
        pins: vec![],
    };
    client.update_key("KEY-1", &spec).await.unwrap();
    client.delete_key("KEY-1").await.unwrap();
}

#[tokio::test]
async fn test_lock_handle_resolves_and_caches_name() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    mock.mock_locks(common::ringo_mock::sample_locks(), Some(2))
        .await;

    let client = Arc::new(client_for(&mock.base_url));
    let named = LockHandle::new(Arc::clone(&client), 1, 1);
    let unnamed = LockHandle::new(Arc::clone(&client), 2, 2);

    assert_eq!(named.get_name().await.unwrap().as_deref(), Some("Front door"));
    assert_eq!(named.get_name().await.unwrap().as_deref(), Some("Front door"));
    assert_eq!(unnamed.get_name().await.unwrap(), None);
}

#[tokio::test]
async fn test_open_door_by_pin_body() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    Mock::given(method("POST"))
        .and(path("/api/open-door-by-pin"))
        .and(body_json(json!({"lock_id": 7, "relay_id": 1, "pin": "4321", "open": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let client = Arc::new(client_for(&mock.base_url));
    let handle = LockHandle::new(client, 7, 1);
    let response = handle.open_door_by_pin("4321", true).await.unwrap();
    assert_eq!(response["status"], 200);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(Some(1)).await;

    let client = client_for(&mock.base_url);
    assert!(client.authenticate().await);

    client.close().await;
    client.close().await;

    assert!(client.is_closed().await);
    assert!(client.tokens().current().await.is_none());

    let err = assert_err!(client.get_locks().await);
    assert!(matches!(err, RingoError::SessionClosed(_)));
}
