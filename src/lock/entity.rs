//! Lock entity: unlock/lock state machine with auto-lock
//!
//! An entity starts `Locked`. A successful unlock moves it to `Unlocked`
//! and arms the auto-lock timer; the timer, or an explicit lock command,
//! moves it back to `Locked`. Re-locking never calls the vendor, the
//! door mechanism re-latches on its own.

use crate::client::models::{response_status, LockRef};
use crate::error::{Result, RingoError};
use crate::lock::handle::LockHandle;
use crate::lock::selector::select_key_preferring;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Reported lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    Locked,
    Unlocked,
}

#[derive(Debug, Default)]
struct EntityState {
    auto_lock: Option<CancellationToken>,
    preferred_key: Option<String>,
}

/// Lock entity exposed to the host
#[derive(Debug)]
pub struct LockEntity {
    handle: Arc<LockHandle>,
    unique_id: String,
    name: Option<String>,
    auto_lock_time: Duration,
    state_tx: Arc<watch::Sender<LockState>>,
    inner: Arc<Mutex<EntityState>>,
}

impl LockEntity {
    /// Create a locked entity without resolving its display name
    pub fn new(handle: Arc<LockHandle>, auto_lock_time: Duration) -> Self {
        let unique_id = format!("{}_{}", handle.lock_id(), handle.relay_id());
        let (state_tx, _) = watch::channel(LockState::Locked);

        Self {
            handle,
            unique_id,
            name: None,
            auto_lock_time,
            state_tx: Arc::new(state_tx),
            inner: Arc::new(Mutex::new(EntityState::default())),
        }
    }

    /// Create an entity and resolve its display name once.
    ///
    /// A failed lookup is logged and leaves the entity unnamed.
    pub async fn register(handle: Arc<LockHandle>, auto_lock_time: Duration) -> Self {
        let mut entity = Self::new(handle, auto_lock_time);
        match entity.handle.get_name().await {
            Ok(name) => entity.name = name,
            Err(e) => warn!("Could not resolve name for {}: {e}", entity.unique_id),
        }
        entity
    }

    /// Stable identifier, `"{lock_id}_{relay_id}"`
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn lock_ref(&self) -> LockRef {
        self.handle.lock_ref()
    }

    pub fn handle(&self) -> &Arc<LockHandle> {
        &self.handle
    }

    pub fn auto_lock_time(&self) -> Duration {
        self.auto_lock_time
    }

    /// Current state
    pub fn state(&self) -> LockState {
        *self.state_tx.borrow()
    }

    pub fn is_locked(&self) -> bool {
        self.state() == LockState::Locked
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.state_tx.subscribe()
    }

    /// State attributes reported alongside the lock state
    pub fn attributes(&self) -> Value {
        json!({
            "lock_id": self.handle.lock_id(),
            "relay_id": self.handle.relay_id(),
            "auto_lock_time": self.auto_lock_time.as_secs(),
        })
    }

    /// Pin a key to try first on the next unlocks
    pub async fn set_preferred_key(&self, digital_key: impl Into<String>) {
        let digital_key = digital_key.into();
        debug!("Pinned preferred key on {}", self.unique_id);
        self.inner.lock().await.preferred_key = Some(digital_key);
    }

    pub async fn preferred_key(&self) -> Option<String> {
        self.inner.lock().await.preferred_key.clone()
    }

    /// Unlock the door and arm the auto-lock timer.
    ///
    /// The key list is fetched fresh on every call. Without a usable key
    /// the action is aborted with a policy error before `open-door` is
    /// called. The entity stays locked on any failure.
    pub async fn unlock(&self) -> Result<()> {
        let target = self.handle.lock_ref();
        let keys = self.handle.client().get_digital_keys().await?;
        let preferred = self.preferred_key().await;

        let Some(key) = select_key_preferring(&keys, target, preferred.as_deref()) else {
            error!("No valid digital key found for {target}");
            return Err(RingoError::policy(format!(
                "No valid digital key found for {target}"
            )));
        };

        let response = self.handle.open_door(&key.digital_key).await?;
        if response_status(&response) != Some(200) {
            error!("Failed to unlock {target}: {response}");
            return Err(RingoError::device_control(format!(
                "Unlock of {target} rejected: {response}"
            )));
        }

        info!("Unlocked {target}");
        self.set_state(LockState::Unlocked);
        self.arm_auto_lock().await;
        Ok(())
    }

    /// Mark the door locked and cancel any pending auto-lock
    pub async fn lock(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(timer) = inner.auto_lock.take() {
            timer.cancel();
        }
        self.set_state(LockState::Locked);
        debug!("Locked {}", self.unique_id);
    }

    /// Whether an auto-lock timer is pending
    pub async fn auto_lock_pending(&self) -> bool {
        self.inner.lock().await.auto_lock.is_some()
    }

    /// Cancel the pending auto-lock without changing state
    pub async fn shutdown(&self) {
        if let Some(timer) = self.inner.lock().await.auto_lock.take() {
            timer.cancel();
        }
    }

    async fn arm_auto_lock(&self) {
        let token = CancellationToken::new();
        {
            let mut inner = self.inner.lock().await;
            if let Some(previous) = inner.auto_lock.replace(token.clone()) {
                previous.cancel();
            }
        }

        let delay = self.auto_lock_time;
        let inner = Arc::clone(&self.inner);
        let state_tx = Arc::clone(&self.state_tx);
        let unique_id = self.unique_id.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // Cancellation happens under the same lock, so a timer
                    // replaced while we waited for it never fires.
                    let mut inner = inner.lock().await;
                    if token.is_cancelled() {
                        return;
                    }
                    inner.auto_lock = None;
                    state_tx.send_replace(LockState::Locked);
                    info!("Auto-locked {unique_id}");
                }
            }
        });
    }

    fn set_state(&self, state: LockState) {
        self.state_tx.send_replace(state);
    }
}
