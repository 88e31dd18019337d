pub mod calls;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod favorites;
pub mod moderation;
pub mod notifications;
pub mod ports;
pub mod profile_store;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{AgeRange, Catalog, CatalogSort};
pub use domain::{
    ActiveCall, CallState, CardDetails, CatalogItem, CustomerDetails, Identity, ItemId, ItemStatus,
    ModerationDecision, Notification, NotificationCategory, Offering, PaymentReceipt,
    PaymentRequest, PendingReview, Profile, Purchase, Review, ReviewStatus, Selection,
    VerificationDetails, VerificationStatus,
};
pub use error::{SessionError, SessionResult};
pub use moderation::TrustedReview;
pub use ports::{
    CatalogService, Clock, DurableSlot, PaymentService, PortError, PortResult, SystemClock,
};
pub use profile_store::{ProfileStore, SlotKeys};
pub use session::{ActiveCallView, SessionFacade};
