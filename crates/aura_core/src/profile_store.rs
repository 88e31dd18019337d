//! crates/aura_core/src/profile_store.rs
//!
//! The serialization boundary between the session and its durable slot.
//! Holds no business logic: it reads and writes the signed-in profile and the
//! active-call pointer under two named keys.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{ActiveCall, Profile};
use crate::ports::{DurableSlot, PortError, PortResult};

pub const DEFAULT_PROFILE_KEY: &str = "auraUser";
pub const DEFAULT_ACTIVE_CALL_KEY: &str = "auraPurchasedCall";

/// The two key names used inside the durable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKeys {
    pub profile: String,
    pub active_call: String,
}

impl Default for SlotKeys {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE_KEY.to_string(),
            active_call: DEFAULT_ACTIVE_CALL_KEY.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ProfileStore {
    slot: Arc<dyn DurableSlot>,
    keys: SlotKeys,
}

impl ProfileStore {
    pub fn new(slot: Arc<dyn DurableSlot>) -> Self {
        Self::with_keys(slot, SlotKeys::default())
    }

    pub fn with_keys(slot: Arc<dyn DurableSlot>, keys: SlotKeys) -> Self {
        Self { slot, keys }
    }

    pub async fn load_profile(&self) -> PortResult<Option<Profile>> {
        self.load(&self.keys.profile).await
    }

    pub async fn save_profile(&self, profile: &Profile) -> PortResult<()> {
        self.save(&self.keys.profile, profile).await
    }

    pub async fn clear_profile(&self) -> PortResult<()> {
        self.slot.remove(&self.keys.profile).await
    }

    pub async fn load_active_call(&self) -> PortResult<Option<ActiveCall>> {
        self.load(&self.keys.active_call).await
    }

    pub async fn save_active_call(&self, call: &ActiveCall) -> PortResult<()> {
        self.save(&self.keys.active_call, call).await
    }

    pub async fn clear_active_call(&self) -> PortResult<()> {
        self.slot.remove(&self.keys.active_call).await
    }

    /// A value that no longer parses is treated as absent so a stale record
    /// cannot wedge startup.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let Some(raw) = self.slot.read(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding unreadable record under '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> PortResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.slot.write(key, &raw).await?;
        debug!("Wrote {} bytes under '{}'", raw.len(), key);
        Ok(())
    }
}
