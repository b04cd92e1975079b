//! Vendor API credentials
//!
//! One client id / secret pair per logical connection. The pair is fixed
//! for the connection's lifetime and the secret never appears in logs.

use crate::error::{RingoError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Environment variable holding the API client id
pub const CLIENT_ID_VAR: &str = "RINGO_CLIENT_ID";

/// Environment variable holding the API secret
pub const CLIENT_SECRET_VAR: &str = "RINGO_CLIENT_SECRET";

/// Ringo API credentials
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    secret: String,
}

impl Credentials {
    /// Create credentials from a client id and secret
    pub fn new(client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: secret.into(),
        }
    }

    /// Read credentials from `RINGO_CLIENT_ID` / `RINGO_CLIENT_SECRET`
    pub fn from_env() -> Result<Self> {
        let client_id = env::var(CLIENT_ID_VAR)
            .map_err(|_| RingoError::config(format!("{CLIENT_ID_VAR} is not set")))?;
        let secret = env::var(CLIENT_SECRET_VAR)
            .map_err(|_| RingoError::config(format!("{CLIENT_SECRET_VAR} is not set")))?;

        let credentials = Self::new(client_id, secret);
        credentials.validate()?;
        Ok(credentials)
    }

    /// Reject blank fields
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(RingoError::config("Client id cannot be empty"));
        }
        if self.secret.trim().is_empty() {
            return Err(RingoError::config("Client secret cannot be empty"));
        }
        Ok(())
    }

    /// API client id
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
