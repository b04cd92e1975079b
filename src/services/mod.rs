//! Named remote actions
//!
//! Every action takes a validated parameter type and answers with a
//! [`ServiceResponse`] envelope. Failures never escape as errors, with one
//! exception: `set_digital_key` re-raises network failures so the caller
//! finishing the action sees them.

pub mod params;

use crate::client::models::envelope_items;
use crate::connection::ConnectionSlot;
use crate::error::{Result, RingoError};
use crate::logging::{redact, sanitize_params};
use params::{
    CreateKeyParams, DigitalKeyParams, NoParams, SetDigitalKeyParams, UpdateKeyParams,
};
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Action names as exposed to the host
pub mod names {
    pub const CREATE_KEY: &str = "create_key";
    pub const UPDATE_KEY: &str = "update_key";
    pub const DELETE_KEY: &str = "delete_key";
    pub const SET_DIGITAL_KEY: &str = "set_digital_key";
    pub const GET_LOCKS: &str = "get_locks";
    pub const GET_KEYS: &str = "get_keys";
    pub const GET_USERS: &str = "get_users";
    pub const GET_KEY_STATUS: &str = "get_key_status";

    /// Every registered action
    pub const ALL: [&str; 8] = [
        CREATE_KEY,
        UPDATE_KEY,
        DELETE_KEY,
        SET_DIGITAL_KEY,
        GET_LOCKS,
        GET_KEYS,
        GET_USERS,
        GET_KEY_STATUS,
    ];
}

/// Result envelope, `{success, result}` or `{success, error, error_code}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Numeric [`ErrorCode`](crate::error::ErrorCode) when the failure came from a classified error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
}

impl ServiceResponse {
    /// Create successful response
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            error_code: None,
        }
    }

    /// Create error response
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
            error_code: None,
        }
    }

    /// Create error response carrying the error's code
    pub fn from_error(error: &RingoError) -> Self {
        Self {
            error_code: Some(error.to_error_code().as_number()),
            ..Self::failure(error.sanitized_message())
        }
    }

    /// Create response from Result
    pub fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result.and_then(|data| serde_json::to_value(data).map_err(RingoError::from)) {
            Ok(data) => Self::success(data),
            Err(e) => Self::from_error(&e),
        }
    }
}

/// Handlers for the named actions of the active connection
#[derive(Debug, Clone)]
pub struct Services {
    connections: Arc<ConnectionSlot>,
}

impl Services {
    pub fn new(connections: Arc<ConnectionSlot>) -> Self {
        Self { connections }
    }

    /// JSON schema of an action's parameters; `None` for unknown actions
    pub fn schema(name: &str) -> Option<RootSchema> {
        let schema = match name {
            names::CREATE_KEY => schema_for!(CreateKeyParams),
            names::UPDATE_KEY => schema_for!(UpdateKeyParams),
            names::DELETE_KEY | names::GET_KEY_STATUS => schema_for!(DigitalKeyParams),
            names::SET_DIGITAL_KEY => schema_for!(SetDigitalKeyParams),
            names::GET_LOCKS | names::GET_KEYS | names::GET_USERS => schema_for!(NoParams),
            _ => return None,
        };
        Some(schema)
    }

    /// Dispatch an action by name with raw JSON parameters
    pub async fn call(&self, name: &str, params: Value) -> Result<ServiceResponse> {
        debug!("Action {name} called with {}", sanitize_params(&params));

        let response = match name {
            names::CREATE_KEY => match parse::<CreateKeyParams>(params) {
                Ok(p) => self.create_key(p).await,
                Err(e) => ServiceResponse::from_result::<()>(Err(e)),
            },
            names::UPDATE_KEY => match parse::<UpdateKeyParams>(params) {
                Ok(p) => self.update_key(p).await,
                Err(e) => ServiceResponse::from_result::<()>(Err(e)),
            },
            names::DELETE_KEY => match parse::<DigitalKeyParams>(params) {
                Ok(p) => self.delete_key(p).await,
                Err(e) => ServiceResponse::from_result::<()>(Err(e)),
            },
            names::SET_DIGITAL_KEY => match parse::<SetDigitalKeyParams>(params) {
                Ok(p) => return self.set_digital_key(p).await,
                Err(e) => ServiceResponse::from_result::<()>(Err(e)),
            },
            names::GET_LOCKS => self.get_locks().await,
            names::GET_KEYS => self.get_keys().await,
            names::GET_USERS => self.get_users().await,
            names::GET_KEY_STATUS => match parse::<DigitalKeyParams>(params) {
                Ok(p) => self.get_key_status(p).await,
                Err(e) => ServiceResponse::from_result::<()>(Err(e)),
            },
            other => ServiceResponse::failure(format!("Unknown action: {other}")),
        };
        Ok(response)
    }

    /// Create a new digital key
    pub async fn create_key(&self, params: CreateKeyParams) -> ServiceResponse {
        let result = self
            .run("create digital key", |services| async move {
                params.validate()?;
                let connection = services.connections.require().await?;
                connection.client().create_key(&params.to_spec()).await
            })
            .await;
        if let Some(created) = &result.result {
            info!("Created new digital key: {}", sanitize_params(created));
        }
        result
    }

    /// Replace the definition of an existing digital key
    pub async fn update_key(&self, params: UpdateKeyParams) -> ServiceResponse {
        let result = self
            .run("update digital key", |services| async move {
                params.validate()?;
                let connection = services.connections.require().await?;
                connection
                    .client()
                    .update_key(&params.digital_key, &params.key.to_spec())
                    .await
            })
            .await;
        if let Some(updated) = &result.result {
            info!("Updated digital key: {}", sanitize_params(updated));
        }
        result
    }

    /// Delete a digital key
    pub async fn delete_key(&self, params: DigitalKeyParams) -> ServiceResponse {
        let result = self
            .run("delete digital key", |services| async move {
                params.validate()?;
                let connection = services.connections.require().await?;
                connection.client().delete_key(&params.digital_key).await
            })
            .await;
        if result.success {
            info!("Deleted digital key");
        }
        result
    }

    /// Validate a key with the vendor and pin it on a lock entity.
    ///
    /// Unknown entities and invalid keys are logged and reported as a
    /// failed envelope. Errors talking to the vendor are returned.
    pub async fn set_digital_key(&self, params: SetDigitalKeyParams) -> Result<ServiceResponse> {
        if let Err(e) = params.validate() {
            error!("Invalid set_digital_key parameters: {e}");
            return Ok(ServiceResponse::from_error(&e));
        }

        let connection = match self.connections.require().await {
            Ok(connection) => connection,
            Err(e) => {
                error!("{e}");
                return Ok(ServiceResponse::from_error(&e));
            }
        };

        let Some(entity) = connection.entity(&params.entity_id) else {
            error!("Lock entity not found: {}", params.entity_id);
            return Ok(ServiceResponse::failure(format!(
                "Lock entity not found: {}",
                params.entity_id
            )));
        };

        let status = match connection.client().get_key_status(&params.digital_key).await {
            Ok(status) => status,
            Err(e) => {
                error!("Failed to set digital key: {e}");
                return Err(e);
            }
        };

        if !status.is_valid() {
            error!("Invalid digital key");
            return Ok(ServiceResponse::failure("Invalid digital key"));
        }

        entity.set_preferred_key(params.digital_key.clone()).await;
        info!("Set digital key on {}", entity.unique_id());
        Ok(ServiceResponse::success(json!({
            "entity_id": entity.unique_id(),
            "digital_key": redact(&params.digital_key),
        })))
    }

    /// All locks, with their count
    pub async fn get_locks(&self) -> ServiceResponse {
        self.run("get locks", |services| async move {
            let connection = services.connections.require().await?;
            let locks = connection.client().get_locks().await?;
            info!("Retrieved {} locks", locks.len());
            Ok(json!({ "count": locks.len(), "locks": locks }))
        })
        .await
    }

    /// Raw key list, with the number of key records
    pub async fn get_keys(&self) -> ServiceResponse {
        self.run("get keys", |services| async move {
            let connection = services.connections.require().await?;
            let keys = connection.client().get_keys().await?;
            let count = envelope_items(&keys).map_or(0, Vec::len);
            info!("Retrieved {count} keys");
            Ok(json!({ "count": count, "keys": keys }))
        })
        .await
    }

    /// All users, with their count
    pub async fn get_users(&self) -> ServiceResponse {
        self.run("get users", |services| async move {
            let connection = services.connections.require().await?;
            let users = connection.client().get_users().await?;
            info!("Retrieved {} users", users.len());
            Ok(json!({ "count": users.len(), "users": users }))
        })
        .await
    }

    /// Status of one key, summarized as `valid` or `invalid`
    pub async fn get_key_status(&self, params: DigitalKeyParams) -> ServiceResponse {
        self.run("get key status", |services| async move {
            params.validate()?;
            let connection = services.connections.require().await?;
            let status = connection.client().get_key_status(&params.digital_key).await?;
            let state = if status.is_valid() { "valid" } else { "invalid" };
            info!("Retrieved key status: {state}");
            Ok(json!({ "state": state, "key_status": status }))
        })
        .await
    }

    async fn run<F, Fut, T>(&self, action: &str, f: F) -> ServiceResponse
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Serialize,
    {
        let result = f(self.clone()).await;
        if let Err(e) = &result {
            let code = e.to_error_code();
            error!(
                code = code.as_number(),
                category = code.category(),
                "Failed to {action}: {e}"
            );
        }
        ServiceResponse::from_result(result)
    }
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|e| RingoError::invalid_input(format!("Invalid parameters: {e}")))
}
