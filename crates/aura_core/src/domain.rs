//! crates/aura_core/src/domain.rs
//!
//! Defines the core data structures of the storefront session.
//! Status fields are explicit enums so loosely-typed collaborator records are
//! validated at the boundary where they enter the core.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a catalog item.
pub type ItemId = String;

//=========================================================================================
// Catalog Records
//=========================================================================================

/// Availability of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Online,
    Offline,
}

impl ItemStatus {
    pub fn toggled(self) -> Self {
        match self {
            ItemStatus::Online => ItemStatus::Offline,
            ItemStatus::Offline => ItemStatus::Online,
        }
    }
}

/// A purchasable timed call length offered by a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub id: u32,
    pub duration_minutes: u32,
    pub price: f64,
    pub product_hash: String,
    pub offer_hash: String,
}

impl Offering {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// The price in minor currency units, as the payment gateway expects it.
    pub fn price_cents(&self) -> i64 {
        (self.price * 100.0).round() as i64
    }
}

/// Moderation state of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// The only two outcomes an operator can pick for a pending review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationDecision {
    Approved,
    Rejected,
}

impl From<ModerationDecision> for ReviewStatus {
    fn from(decision: ModerationDecision) -> Self {
        match decision {
            ModerationDecision::Approved => ReviewStatus::Approved,
            ModerationDecision::Rejected => ReviewStatus::Rejected,
        }
    }
}

impl ModerationDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationDecision::Approved => "approved",
            ModerationDecision::Rejected => "rejected",
        }
    }
}

/// A customer or operator review attached to a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub status: ReviewStatus,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    /// Lead reviews are approved but kept out of the public listing.
    #[serde(default)]
    pub hidden: bool,
}

impl Review {
    /// A review is publicly listed iff it is approved and not hidden.
    pub fn is_public(&self) -> bool {
        self.status == ReviewStatus::Approved && !self.hidden
    }
}

/// A catalog entry ("model") that can be booked for a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub age: u32,
    pub bio: String,
    pub profile_image: String,
    pub gallery_images: Vec<String>,
    pub video_url: String,
    pub status: ItemStatus,
    pub offerings: Vec<Offering>,
    pub reviews: Vec<Review>,
}

impl CatalogItem {
    pub fn offering(&self, offering_id: u32) -> Option<&Offering> {
        self.offerings.iter().find(|o| o.id == offering_id)
    }
}

//=========================================================================================
// Purchases and Calls
//=========================================================================================

/// The pending selection (the "bag"): a snapshot of one item and one of its offerings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub item: CatalogItem,
    pub offering: Offering,
}

/// An immutable record of a bought timed call.
///
/// `feedback_submitted` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub item: CatalogItem,
    pub offering: Offering,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub purchased_at: DateTime<Utc>,
    #[serde(default)]
    pub feedback_submitted: bool,
}

impl Purchase {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.purchased_at + self.offering.duration()
    }
}

/// Pointer (by purchase timestamp) to the purchase currently shown as rejoinable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCall {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub purchased_at: DateTime<Utc>,
}

/// Temporal state of a purchase, always derived from the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CallState {
    Active { remaining_ms: i64 },
    Completed,
}

impl CallState {
    pub fn is_completed(&self) -> bool {
        matches!(self, CallState::Completed)
    }
}

/// Truncates an instant to the millisecond precision purchases are keyed by.
pub fn purchase_instant(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(3)
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Success,
    Error,
    Info,
}

/// An entry in the profile's append-only notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub category: NotificationCategory,
    pub read: bool,
}

//=========================================================================================
// Profile
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Unverified,
    Pending,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    DriversLicense,
    Passport,
    NationalId,
}

/// Identity document details submitted for account verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub document_type: DocumentType,
    pub document_number: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// The fields a registration form or the social-login relay hands over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// The signed-in user's session-scoped aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Primary key; never changes after registration.
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub verification_details: Option<VerificationDetails>,
    #[serde(default)]
    pub purchase_history: Vec<Purchase>,
    #[serde(default)]
    pub favorites: BTreeSet<ItemId>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl Profile {
    /// A fresh, unverified profile with empty collections.
    pub fn new(identity: Identity) -> Self {
        Self {
            name: identity.name,
            email: identity.email,
            avatar: identity.avatar,
            bio: None,
            verification_status: VerificationStatus::Unverified,
            verification_details: None,
            purchase_history: Vec::new(),
            favorites: BTreeSet::new(),
            notifications: Vec::new(),
        }
    }

    pub fn purchase(&self, purchased_at: DateTime<Utc>) -> Option<&Purchase> {
        self.purchase_history
            .iter()
            .find(|p| p.purchased_at == purchased_at)
    }

    pub fn purchase_mut(&mut self, purchased_at: DateTime<Utc>) -> Option<&mut Purchase> {
        self.purchase_history
            .iter_mut()
            .find(|p| p.purchased_at == purchased_at)
    }
}

//=========================================================================================
// Checkout
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvv: String,
}

/// Everything the payment collaborator needs to charge for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount_cents: i64,
    pub title: String,
    pub payer: CustomerDetails,
    pub card: CardDetails,
    pub offering: Offering,
}

/// Acknowledgment returned by the payment collaborator on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: Option<String>,
}

/// A pending review flattened out of its catalog item for the moderation queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReview {
    pub item_id: ItemId,
    pub item_name: String,
    pub review: Review,
}
