//! services/api/src/adapters/memory.rs
//!
//! A process-local `DurableSlot`. Nothing survives a restart of the process.

use async_trait::async_trait;
use aura_core::ports::{DurableSlot, PortResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemorySlot {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableSlot for InMemorySlot {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> PortResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
