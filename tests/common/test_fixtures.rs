//! Test fixtures and utilities for consistent test setup

use super::ringo_mock::{CLIENT_ID, SECRET};
use ringo_bridge::{BridgeConfig, Credentials, RingoClient};
use rstest::*;
use std::time::Duration;
use url::Url;

/// Configuration pointing at a mock server, with short timeouts
#[fixture]
pub fn test_config(#[default("http://localhost:8080/api/")] base_url: &str) -> BridgeConfig {
    BridgeConfig {
        base_url: Url::parse(base_url).expect("Valid URL"),
        timeout: Duration::from_secs(2),
        auto_lock_time: Duration::from_secs(1),
        verify_ssl: false,
        ..BridgeConfig::default()
    }
}

/// Credentials accepted by the mock token endpoint
#[fixture]
pub fn test_credentials() -> Credentials {
    Credentials::new(CLIENT_ID, SECRET)
}

/// Client for the mock server at `base_url`
pub fn client_for(base_url: &str) -> RingoClient {
    RingoClient::new(&test_config(base_url), test_credentials()).expect("Valid client")
}

/// Environment variables for clean configuration tests
pub fn get_test_env_vars() -> Vec<(&'static str, Option<&'static str>)> {
    vec![
        ("RINGO_BASE_URL", Some("http://localhost:9000/api/")),
        ("RINGO_TIMEOUT", Some("15s")),
        ("RINGO_MAX_RETRIES", Some("4")),
        ("RINGO_AUTO_LOCK_TIME", Some("10s")),
        ("RINGO_LOGGING__LEVEL", Some("debug")),
        ("RINGO_CLIENT_ID", Some(CLIENT_ID)),
        ("RINGO_CLIENT_SECRET", Some(SECRET)),
    ]
}
