//! Bearer token lifecycle
//!
//! The token manager owns the current bearer token and its expiry. Refreshes
//! swap in a whole new [`BearerToken`]; readers hold an `Arc` snapshot and
//! never observe a half-updated value. All (re)authentication runs under a
//! single async mutex so concurrent callers wait for one in-flight
//! authentication instead of starting their own.

use crate::client::session::Session;
use crate::config::credentials::Credentials;
use crate::error::{Result, RingoError};
use crate::logging::redact;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use url::Url;

/// Header carrying the API client id on the token endpoint
pub const CLIENT_HEADER: &str = "Ringo-Api-Client";

/// Header carrying the API secret on the token endpoint
pub const SECRET_HEADER: &str = "Ringo-Api-Secret";

/// Token endpoint, relative to the API root
pub const TOKEN_ENDPOINT: &str = "token";

/// Issued bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Create a token valid until `expires_at`
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Raw token string for the `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Expiry instant
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token is usable only strictly before its expiry
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("value", &redact(&self.value))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Owns the bearer token for one connection
pub struct TokenManager {
    token_url: Url,
    credentials: Credentials,
    lifetime: Duration,
    session: Arc<Session>,
    current: Mutex<Option<Arc<BearerToken>>>,
    authentications: AtomicU64,
}

impl TokenManager {
    /// Create a token manager; no request is made until a token is needed
    pub fn new(
        api_root: &Url,
        credentials: Credentials,
        lifetime: Duration,
        session: Arc<Session>,
    ) -> Result<Self> {
        let token_url = api_root
            .join(TOKEN_ENDPOINT)
            .map_err(|e| RingoError::config(format!("Invalid token URL: {e}")))?;

        Ok(Self {
            token_url,
            credentials,
            lifetime,
            session,
            current: Mutex::new(None),
            authentications: AtomicU64::new(0),
        })
    }

    /// Authenticate against the vendor and store a fresh token.
    ///
    /// Never fails loudly: invalid credentials, unexpected statuses,
    /// malformed bodies and timeouts are logged and reported as `false`.
    pub async fn authenticate(&self) -> bool {
        let mut slot = self.current.lock().await;
        match self.refresh_locked(&mut slot).await {
            Ok(_) => true,
            Err(e) => {
                error!("Authentication failed: {e}");
                false
            }
        }
    }

    /// Return a token that is valid right now, authenticating first when
    /// the stored one is missing or expired.
    pub async fn ensure_token(&self) -> Result<Arc<BearerToken>> {
        let mut slot = self.current.lock().await;

        if let Some(token) = slot.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(Arc::clone(token));
            }
        }

        debug!("Token expired or missing, reauthenticating");
        self.refresh_locked(&mut slot).await.map_err(|e| {
            error!("Reauthentication failed: {e}");
            match e {
                RingoError::Authentication(_) | RingoError::SessionClosed(_) => e,
                other => RingoError::authentication(format!("Failed to authenticate: {other}")),
            }
        })
    }

    /// Drop `stale` so the next [`ensure_token`](Self::ensure_token)
    /// reauthenticates. A token already replaced by a concurrent refresh is
    /// left alone.
    pub async fn invalidate(&self, stale: &Arc<BearerToken>) {
        let mut slot = self.current.lock().await;
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, stale)) {
            debug!("Discarding rejected token");
            *slot = None;
        }
    }

    /// Forget the current token unconditionally
    pub async fn clear(&self) {
        *self.current.lock().await = None;
    }

    /// Snapshot of the stored token, valid or not
    pub async fn current(&self) -> Option<Arc<BearerToken>> {
        self.current.lock().await.clone()
    }

    /// Number of authentication round-trips performed so far
    pub fn authentication_count(&self) -> u64 {
        self.authentications.load(Ordering::Relaxed)
    }

    async fn refresh_locked(
        &self,
        slot: &mut Option<Arc<BearerToken>>,
    ) -> Result<Arc<BearerToken>> {
        let token = Arc::new(self.request_token().await?);
        *slot = Some(Arc::clone(&token));
        Ok(token)
    }

    async fn request_token(&self) -> Result<BearerToken> {
        self.authentications.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Requesting token for client {}",
            self.credentials.client_id()
        );

        let client = self.session.client().await?;
        let response = client
            .get(self.token_url.clone())
            .header(CLIENT_HEADER, self.credentials.client_id())
            .header(SECRET_HEADER, self.credentials.secret())
            .send()
            .await
            .map_err(RingoError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(RingoError::from_transport)?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(RingoError::authentication("Invalid credentials"));
        }
        if status != StatusCode::OK {
            return Err(RingoError::status(status.as_u16(), body));
        }

        let envelope: TokenEnvelope = serde_json::from_str(&body).map_err(|e| {
            RingoError::parsing(format!("Token response is not valid JSON: {e}"))
        })?;

        let value = match envelope.data {
            Some(serde_json::Value::String(token)) if !token.is_empty() => token,
            _ => return Err(RingoError::parsing("No token received in response")),
        };

        let lifetime = chrono::Duration::from_std(self.lifetime)
            .map_err(|e| RingoError::config(format!("Token lifetime out of range: {e}")))?;
        let token = BearerToken::new(value, Utc::now() + lifetime);
        info!("Authentication successful, token valid until {}", token.expires_at());
        Ok(token)
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url.as_str())
            .field("credentials", &self.credentials)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
