//! Connection lifecycle and the single-connection registry
//!
//! A [`Connection`] owns the client for one credential pair plus the lock
//! entities discovered on it. The process supports one active connection
//! at a time; [`ConnectionSlot`] is the owned slot that holds it.

use crate::client::RingoClient;
use crate::config::{credentials::Credentials, BridgeConfig};
use crate::error::{Result, RingoError};
use crate::lock::{LockEntity, LockHandle};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// An authenticated connection and its lock entities
#[derive(Debug)]
pub struct Connection {
    client: Arc<RingoClient>,
    entities: Vec<Arc<LockEntity>>,
}

impl Connection {
    /// Authenticate, discover locks and build one entity per lock.
    ///
    /// Bad credentials abort with `Authentication`; any other failure while
    /// probing the API is surfaced unchanged. The client is closed on
    /// every failure path.
    pub async fn setup(config: &BridgeConfig, credentials: Credentials) -> Result<Self> {
        debug!("Setting up Ringo connection");
        let client = Arc::new(RingoClient::new(config, credentials)?);

        if !client.authenticate().await {
            error!("Failed to authenticate with Ringo API");
            client.close().await;
            return Err(RingoError::authentication(
                "Failed to authenticate with Ringo API",
            ));
        }

        let locks = match client.get_locks().await {
            Ok(locks) => locks,
            Err(e) => {
                error!("Failed to initialize Ringo API: {e}");
                client.close().await;
                return Err(e);
            }
        };
        info!("Found {} locks", locks.len());

        let mut entities = Vec::with_capacity(locks.len());
        for info in &locks {
            let handle = Arc::new(LockHandle::new(
                Arc::clone(&client),
                info.lock_id,
                info.relay_id,
            ));
            let entity = LockEntity::register(handle, config.auto_lock_time).await;
            debug!("Registered lock entity {}", entity.unique_id());
            entities.push(Arc::new(entity));
        }

        Ok(Self { client, entities })
    }

    pub fn client(&self) -> &Arc<RingoClient> {
        &self.client
    }

    /// Lock entities in discovery order
    pub fn entities(&self) -> &[Arc<LockEntity>] {
        &self.entities
    }

    /// Entity by its `"{lock_id}_{relay_id}"` id
    pub fn entity(&self, unique_id: &str) -> Option<&Arc<LockEntity>> {
        self.entities.iter().find(|e| e.unique_id() == unique_id)
    }

    /// Cancel auto-lock timers and release the client. Idempotent.
    pub async fn unload(&self) {
        for entity in &self.entities {
            entity.shutdown().await;
        }
        self.client.close().await;
        debug!("Ringo connection unloaded");
    }
}

/// Owned slot holding the one active connection
#[derive(Debug, Default)]
pub struct ConnectionSlot {
    slot: RwLock<Option<Arc<Connection>>>,
}

impl ConnectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `connection`; fails if another one is already active
    pub async fn install(&self, connection: Connection) -> Result<Arc<Connection>> {
        let mut slot = self.slot.write().await;
        if slot.is_some() {
            warn!("Refusing to replace the active Ringo connection");
            return Err(RingoError::config("A Ringo connection is already active"));
        }
        let connection = Arc::new(connection);
        *slot = Some(Arc::clone(&connection));
        Ok(connection)
    }

    /// The active connection, if any
    pub async fn get(&self) -> Option<Arc<Connection>> {
        self.slot.read().await.clone()
    }

    /// Like [`get`](Self::get), but a missing connection is a policy error
    pub async fn require(&self) -> Result<Arc<Connection>> {
        self.get()
            .await
            .ok_or_else(|| RingoError::policy("No Ringo connection is set up"))
    }

    /// Clear the slot and unload what it held. Returns whether a
    /// connection was present; calling it again is a no-op.
    pub async fn unload(&self) -> bool {
        let taken = self.slot.write().await.take();
        match taken {
            Some(connection) => {
                connection.unload().await;
                true
            }
            None => false,
        }
    }
}
