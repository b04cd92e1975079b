//! Per-device façade over the vendor client

use crate::client::models::LockRef;
use crate::client::RingoClient;
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// One lock/relay pair bound to the connection's client
#[derive(Debug)]
pub struct LockHandle {
    client: Arc<RingoClient>,
    lock: LockRef,
    name: RwLock<Option<String>>,
}

impl LockHandle {
    /// Bind `lock_id`/`relay_id` to `client`
    pub fn new(client: Arc<RingoClient>, lock_id: i64, relay_id: i64) -> Self {
        Self {
            client,
            lock: LockRef::new(lock_id, relay_id),
            name: RwLock::new(None),
        }
    }

    /// Identifier pair
    pub fn lock_ref(&self) -> LockRef {
        self.lock
    }

    pub fn lock_id(&self) -> i64 {
        self.lock.lock_id
    }

    pub fn relay_id(&self) -> i64 {
        self.lock.relay_id
    }

    /// Client this handle talks through
    pub fn client(&self) -> &Arc<RingoClient> {
        &self.client
    }

    /// Display name from the lock listing, cached after the first hit.
    /// `None` when the listing has no matching lock or no name for it.
    pub async fn get_name(&self) -> Result<Option<String>> {
        if let Some(name) = self.name.read().await.clone() {
            return Ok(Some(name));
        }

        let locks = self.client.get_locks().await?;
        let resolved = locks
            .into_iter()
            .find(|info| info.lock_ref() == self.lock)
            .and_then(|info| info.name);

        match &resolved {
            Some(name) => {
                debug!("Resolved name {name:?} for {}", self.lock);
                *self.name.write().await = Some(name.clone());
            }
            None => debug!("No name found for {}", self.lock),
        }
        Ok(resolved)
    }

    /// Open this door with a digital key
    pub async fn open_door(&self, digital_key: &str) -> Result<Value> {
        self.client
            .open_door(self.lock.lock_id, self.lock.relay_id, digital_key)
            .await
    }

    /// Open this door with a PIN
    pub async fn open_door_by_pin(&self, pin: &str, open: bool) -> Result<Value> {
        self.client
            .open_door_by_pin(self.lock.lock_id, self.lock.relay_id, pin, open)
            .await
    }
}
