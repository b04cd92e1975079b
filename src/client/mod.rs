//! Ringo cloud API client
//!
//! [`RingoClient`] exposes one typed method per vendor endpoint. Every call
//! goes through the [`RequestExecutor`](executor::RequestExecutor), which
//! injects the bearer token and applies the retry policy. Nothing here
//! retries or swallows executor failures; list endpoints only degrade an
//! empty or malformed envelope to an empty list.

pub mod executor;
pub mod models;
pub mod retry;
pub mod session;
pub mod token;

use crate::config::{credentials::Credentials, BridgeConfig};
use crate::error::Result;
use executor::{RequestBody, RequestExecutor};
use models::{parse_items, DigitalKey, KeySpec, KeyStatus, LockInfo};
use reqwest::Method;
use retry::RetryPolicy;
use serde_json::{json, Value};
use session::Session;
use std::sync::Arc;
use token::TokenManager;
use tracing::{debug, error, info};

/// Vendor endpoints, relative to the API root
pub mod endpoints {
    pub const LOCKS: &str = "locks";
    pub const KEY_LIST: &str = "key-list";
    pub const USERS: &str = "users";
    pub const KEY: &str = "key";
    pub const OPEN_DOOR: &str = "open-door";
    pub const OPEN_DOOR_BY_PIN: &str = "open-door-by-pin";
}

/// Typed client for one Ringo connection
#[derive(Debug)]
pub struct RingoClient {
    session: Arc<Session>,
    tokens: Arc<TokenManager>,
    executor: RequestExecutor,
}

impl RingoClient {
    /// Create a client; the transport and token are created lazily
    pub fn new(config: &BridgeConfig, credentials: Credentials) -> Result<Self> {
        credentials.validate()?;

        let api_root = config.api_root();
        let session = Arc::new(Session::new(config));
        let tokens = Arc::new(TokenManager::new(
            &api_root,
            credentials,
            config.token_lifetime,
            Arc::clone(&session),
        )?);
        let policy = RetryPolicy::new(config.max_retries).with_backoff(config.retry_backoff);
        let executor =
            RequestExecutor::new(api_root, Arc::clone(&session), Arc::clone(&tokens), policy);

        Ok(Self {
            session,
            tokens,
            executor,
        })
    }

    /// Authenticate with the vendor; `false` on any failure
    pub async fn authenticate(&self) -> bool {
        debug!("Authenticating with Ringo API");
        self.tokens.authenticate().await
    }

    /// Token manager of this connection
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Send an arbitrary authenticated request
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
    ) -> Result<Value> {
        self.executor.request(method, endpoint, body).await
    }

    /// All locks visible to these credentials
    pub async fn get_locks(&self) -> Result<Vec<LockInfo>> {
        let response = self
            .request(Method::GET, endpoints::LOCKS, RequestBody::Empty)
            .await?;

        let locks: Vec<LockInfo> = parse_items(&response, "lock");
        if locks.is_empty() {
            error!("No locks found in response: {response}");
        }
        Ok(locks)
    }

    /// Raw key-list response; callers unwrap the envelope themselves
    pub async fn get_keys(&self) -> Result<Value> {
        self.request(Method::GET, endpoints::KEY_LIST, RequestBody::Empty)
            .await
    }

    /// Key list parsed into typed records, malformed records skipped
    pub async fn get_digital_keys(&self) -> Result<Vec<DigitalKey>> {
        let response = self.get_keys().await?;
        Ok(parse_items(&response, "digital key"))
    }

    /// All users of the account
    pub async fn get_users(&self) -> Result<Vec<Value>> {
        let response = self
            .request(Method::GET, endpoints::USERS, RequestBody::Empty)
            .await?;

        match models::envelope_items(&response) {
            Some(users) if !users.is_empty() => Ok(users.clone()),
            _ => {
                error!("No users found in response: {response}");
                Ok(Vec::new())
            }
        }
    }

    /// Full status of one digital key
    pub async fn get_key_status(&self, digital_key: &str) -> Result<KeyStatus> {
        let response = self
            .request(
                Method::GET,
                endpoints::KEY,
                RequestBody::Query(vec![("digital_key".to_string(), digital_key.to_string())]),
            )
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Open a door with a digital key
    pub async fn open_door(&self, lock_id: i64, relay_id: i64, digital_key: &str) -> Result<Value> {
        info!("Opening door lock_id={lock_id}, relay_id={relay_id}");
        self.request(
            Method::POST,
            endpoints::OPEN_DOOR,
            RequestBody::Json(json!({
                "lock_id": lock_id,
                "relay_id": relay_id,
                "digital_key": digital_key,
            })),
        )
        .await
    }

    /// Open (or, with `open = false`, release) a door with a PIN
    pub async fn open_door_by_pin(
        &self,
        lock_id: i64,
        relay_id: i64,
        pin: &str,
        open: bool,
    ) -> Result<Value> {
        info!("Opening door by PIN lock_id={lock_id}, relay_id={relay_id}, open={open}");
        self.request(
            Method::POST,
            endpoints::OPEN_DOOR_BY_PIN,
            RequestBody::Json(json!({
                "lock_id": lock_id,
                "relay_id": relay_id,
                "pin": pin,
                "open": open,
            })),
        )
        .await
    }

    /// Create a digital key
    pub async fn create_key(&self, spec: &KeySpec) -> Result<Value> {
        let body = serde_json::to_value(spec)?;
        self.request(Method::POST, endpoints::KEY, RequestBody::Json(body))
            .await
    }

    /// Replace the definition of an existing key
    pub async fn update_key(&self, digital_key: &str, spec: &KeySpec) -> Result<Value> {
        let mut body = serde_json::to_value(spec)?;
        if let Value::Object(map) = &mut body {
            map.insert("digital_key".to_string(), Value::from(digital_key));
        }
        self.request(Method::PUT, endpoints::KEY, RequestBody::Json(body))
            .await
    }

    /// Delete a digital key
    pub async fn delete_key(&self, digital_key: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            endpoints::KEY,
            RequestBody::Json(json!({ "digital_key": digital_key })),
        )
        .await
    }

    /// Release the transport and forget the token. Idempotent; later calls
    /// fail with `SessionClosed` until [`reopen`](Self::reopen).
    pub async fn close(&self) {
        self.tokens.clear().await;
        self.session.close().await;
    }

    /// Allow requests again after [`close`](Self::close)
    pub async fn reopen(&self) {
        self.session.reopen().await;
    }

    /// Whether the transport has been released
    pub async fn is_closed(&self) -> bool {
        self.session.is_closed().await
    }
}
