//! crates/aura_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the session orchestrator.
//! These traits form the boundary of the hexagonal architecture: the durable
//! key-value slot, the catalog records, the payment gateway and the wall clock
//! are all reached through them, never directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CatalogItem, PaymentReceipt, PaymentRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The collaborator refused the request; the reason is meant for the end user.
    #[error("{0}")]
    Rejected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A named-key durable store holding serialized session records.
#[async_trait]
pub trait DurableSlot: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written or was removed.
    async fn read(&self, key: &str) -> PortResult<Option<String>>;

    /// Overwrites the value under `key`.
    async fn write(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Lists every catalog item together with its offerings and reviews.
    async fn list_items(&self) -> PortResult<Vec<CatalogItem>>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges the payer. A refusal comes back as `PortError::Rejected` carrying
    /// the gateway's reason.
    async fn charge(&self, request: &PaymentRequest) -> PortResult<PaymentReceipt>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
