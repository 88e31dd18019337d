//! crates/aura_core/src/error.rs
//!
//! Defines the error taxonomy returned by the session facade.

use crate::domain::ItemId;
use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The action needs a signed-in profile. Recoverable by prompting a login.
    #[error("You must be logged in to do that.")]
    NotAuthenticated,

    #[error("Offering {offering_id} is not sold by {item_id}.")]
    InvalidSelection { item_id: ItemId, offering_id: u32 },

    #[error("Your bag is empty.")]
    EmptySelection,

    #[error("Please provide a rating or a comment to submit.")]
    EmptyFeedback,

    #[error("Rating must be between 0 and 5, got {0}.")]
    InvalidRating(u8),

    #[error("Review {review_id} was not found on {item_id}.")]
    ReviewNotFound { item_id: ItemId, review_id: String },

    #[error("Catalog item {0} was not found.")]
    ItemNotFound(ItemId),

    /// Purchases are keyed by their timestamp in epoch milliseconds.
    #[error("No purchase was made at {0}.")]
    PurchaseNotFound(i64),

    /// The payment collaborator's reason, passed through verbatim.
    #[error("{0}")]
    PaymentRejected(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PortError),
}

impl SessionError {
    /// Whether the error is the caller's to fix (as opposed to an infrastructure failure).
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, SessionError::Persistence(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
