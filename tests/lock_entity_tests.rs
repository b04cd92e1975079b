//! Unlock state machine and auto-lock against a mock vendor

mod common;

use common::{client_for, MockRingoServer};
use pretty_assertions::assert_eq;
use ringo_bridge::lock::{LockEntity, LockHandle, LockState};
use ringo_bridge::RingoError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn entity_for(
    mock: &MockRingoServer,
    lock_id: i64,
    relay_id: i64,
    auto_lock: Duration,
) -> LockEntity {
    let client = Arc::new(client_for(&mock.base_url));
    let handle = Arc::new(LockHandle::new(client, lock_id, relay_id));
    LockEntity::register(handle, auto_lock).await
}

async fn wait_for_state(entity: &LockEntity, state: LockState) {
    let mut rx = entity.subscribe();
    tokio::time::timeout(Duration::from_secs(3), rx.wait_for(|s| *s == state))
        .await
        .expect("state change in time")
        .expect("entity alive");
}

#[tokio::test]
async fn test_unlock_then_auto_lock_without_second_call() {
    let mock = MockRingoServer::with_defaults().await;
    mock.mock_open_door(1, 1, 200, Some(1)).await;

    let entity = entity_for(&mock, 1, 1, Duration::from_millis(200)).await;
    assert_eq!(entity.name(), Some("Front door"));
    assert!(entity.is_locked());

    entity.unlock().await.unwrap();
    assert_eq!(entity.state(), LockState::Unlocked);
    assert!(entity.auto_lock_pending().await);

    wait_for_state(&entity, LockState::Locked).await;
    assert!(!entity.auto_lock_pending().await);
    assert_eq!(mock.request_count("/api/open-door").await, 1);
}

#[tokio::test]
async fn test_unlock_uses_first_usable_granting_key() {
    let mock = MockRingoServer::with_defaults().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/api/open-door"))
        .and(wiremock::matchers::body_json(json!({
            "lock_id": 1,
            "relay_id": 1,
            "digital_key": "KEY-A"
        })))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let entity = entity_for(&mock, 1, 1, Duration::from_secs(5)).await;
    entity.unlock().await.unwrap();
    entity.lock().await;
    assert!(entity.is_locked());
    assert!(!entity.auto_lock_pending().await);
}

#[tokio::test]
async fn test_no_valid_key_aborts_before_open_door() {
    let mock = MockRingoServer::with_defaults().await;
    mock.mock_open_door(3, 3, 200, Some(0)).await;

    let entity = entity_for(&mock, 3, 3, Duration::from_secs(1)).await;
    let err = entity.unlock().await.unwrap_err();

    assert!(matches!(err, RingoError::Policy(_)));
    assert!(entity.is_locked());
    assert_eq!(mock.request_count("/api/open-door").await, 0);
}

#[tokio::test]
async fn test_rejected_unlock_stays_locked() {
    let mock = MockRingoServer::with_defaults().await;
    mock.mock_open_door(2, 2, 403, Some(1)).await;

    let entity = entity_for(&mock, 2, 2, Duration::from_secs(1)).await;
    let err = entity.unlock().await.unwrap_err();

    assert!(matches!(err, RingoError::DeviceControl(_)));
    assert!(entity.is_locked());
    assert!(!entity.auto_lock_pending().await);
}

#[tokio::test]
async fn test_second_unlock_rearms_timer() {
    let mock = MockRingoServer::with_defaults().await;
    mock.mock_open_door(1, 1, 200, Some(2)).await;

    let entity = entity_for(&mock, 1, 1, Duration::from_millis(400)).await;
    let mut rx = entity.subscribe();

    entity.unlock().await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    entity.unlock().await.unwrap();

    // The first timer would have fired by now had it not been replaced
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(entity.state(), LockState::Unlocked);

    wait_for_state(&entity, LockState::Locked).await;
    assert!(rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_preferred_key_is_tried_first() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    mock.mock_locks(common::ringo_mock::sample_locks(), None).await;
    mock.mock_key_list(
        json!({"data": [
            {
                "digital_key": "FIRST",
                "is_valid": 1,
                "is_ended": 0,
                "locks": [{"lock_id": 1, "relay_id": 1}]
            },
            {
                "digital_key": "PINNED",
                "is_valid": 1,
                "is_ended": 0,
                "locks": [{"lock_id": 1, "relay_id": 1}]
            }
        ]}),
        None,
    )
    .await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/api/open-door"))
        .and(wiremock::matchers::body_partial_json(json!({"digital_key": "PINNED"})))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let entity = entity_for(&mock, 1, 1, Duration::from_secs(5)).await;
    entity.set_preferred_key("PINNED").await;
    entity.unlock().await.unwrap();
    entity.shutdown().await;
}

#[tokio::test]
async fn test_unlock_ignores_auxiliary_key_fields() {
    let mock = MockRingoServer::start().await;
    mock.mock_token(None).await;
    mock.mock_locks(common::ringo_mock::sample_locks(), None).await;
    mock.mock_key_list(
        json!({"data": [
            {
                "digital_key": "ONLY",
                "is_valid": 1,
                "is_ended": 0,
                "locks": [{"lock_id": 1, "relay_id": 1}],
                "times": [{"type": "always"}],
                "pins": null
            },
            {
                "digital_key": "BARE",
                "is_valid": 1,
                "is_ended": 0,
                "locks": null,
                "times": null
            }
        ]}),
        None,
    )
    .await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/api/open-door"))
        .and(wiremock::matchers::body_partial_json(json!({"digital_key": "ONLY"})))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let entity = entity_for(&mock, 1, 1, Duration::from_secs(5)).await;
    entity.unlock().await.unwrap();
    assert_eq!(entity.state(), LockState::Unlocked);
    entity.shutdown().await;
}
