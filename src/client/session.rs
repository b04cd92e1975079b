//! Shared HTTP transport session
//!
//! One `reqwest::Client` per connection, created on first use and released
//! explicitly on shutdown. Once closed, a session refuses to hand out a
//! transport until it is reopened.

use crate::config::BridgeConfig;
use crate::error::{Result, RingoError};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug)]
enum SessionState {
    Idle,
    Open(Client),
    Closed,
}

/// Lazily created, explicitly released HTTP session
#[derive(Debug)]
pub struct Session {
    timeout: Duration,
    verify_ssl: bool,
    state: Mutex<SessionState>,
}

impl Session {
    /// Create a session; no transport is built until first use
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            timeout: config.timeout,
            verify_ssl: config.verify_ssl,
            state: Mutex::new(SessionState::Idle),
        }
    }

    /// Get the shared transport, building it on first use
    pub async fn client(&self) -> Result<Client> {
        let mut state = self.state.lock().await;
        match &*state {
            SessionState::Open(client) => Ok(client.clone()),
            SessionState::Closed => Err(RingoError::session_closed(
                "Connection was closed; reopen it before issuing requests",
            )),
            SessionState::Idle => {
                let client = self.build()?;
                debug!("Created HTTP session");
                *state = SessionState::Open(client.clone());
                Ok(client)
            }
        }
    }

    fn build(&self) -> Result<Client> {
        let mut builder = ClientBuilder::new()
            .timeout(self.timeout)
            .user_agent(format!("ringo-bridge/{}", env!("CARGO_PKG_VERSION")));

        if !self.verify_ssl {
            warn!("SSL verification disabled - this is insecure for production use");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| RingoError::connection(format!("Failed to build HTTP client: {e}")))
    }

    /// Whether a transport is currently live
    pub async fn is_open(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Open(_))
    }

    /// Whether the session has been released
    pub async fn is_closed(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Closed)
    }

    /// Release the transport. Safe to call any number of times.
    pub async fn close(&self) {
        let previous = std::mem::replace(&mut *self.state.lock().await, SessionState::Closed);
        if let SessionState::Open(client) = previous {
            // Dropping the last handle tears down the connection pool.
            drop(client);
            debug!("HTTP session released");
        }
    }

    /// Allow a closed session to build a fresh transport again
    pub async fn reopen(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, SessionState::Closed) {
            *state = SessionState::Idle;
        }
    }
}
