//! crates/aura_core/src/session.rs
//!
//! The session facade: the one interface the presentation layer talks to.
//!
//! Every mutating operation changes one owned sub-store and then awaits the
//! write to the durable slot before returning, so the write for one action is
//! always issued before the next action reads the slot. A failed write is
//! logged and the in-memory state stays authoritative for the session.
//! Derived views (toasts, unread count, call state) are recomputed per call.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::calls::{derive_call_state, CallManager};
use crate::catalog::Catalog;
use crate::domain::{
    ActiveCall, CallState, CardDetails, CatalogItem, CustomerDetails, Identity, ItemId,
    ModerationDecision, Notification, NotificationCategory, PaymentRequest, PendingReview,
    Profile, Purchase, Review, Selection, VerificationDetails, VerificationStatus,
};
use crate::error::{SessionError, SessionResult};
use crate::favorites::{self, FavoriteChange};
use crate::moderation::{self, TrustedReview};
use crate::notifications::NotificationCenter;
use crate::ports::{CatalogService, Clock, PaymentService, PortError};
use crate::profile_store::ProfileStore;

const CATALOG_LOAD_FAILED: &str = "Could not load model data. Please try again later.";
const PAYMENT_FAILED: &str = "Payment failed. Please check your details and try again.";
const PREVIOUS_CALL_ENDED: &str = "Your previous call session has ended.";

/// The active call as the waiting room sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveCallView {
    pub purchase: Purchase,
    pub state: CallState,
}

pub struct SessionFacade {
    store: ProfileStore,
    payments: Arc<dyn PaymentService>,
    clock: Arc<dyn Clock>,
    catalog: Catalog,
    profile: Option<Profile>,
    calls: CallManager,
    notifications: NotificationCenter,
}

impl SessionFacade {
    /// Restores the session from the durable slot and loads the catalog.
    /// A restored call whose window has already closed is ended on the spot.
    ///
    /// A catalog failure is not fatal: the session starts with an empty catalog
    /// and an error notification. An unreachable durable slot is.
    pub async fn start(
        store: ProfileStore,
        catalog_source: &dyn CatalogService,
        payments: Arc<dyn PaymentService>,
        clock: Arc<dyn Clock>,
    ) -> SessionResult<Self> {
        let profile = store.load_profile().await?;
        let active = store.load_active_call().await?;
        info!(
            "Session restored (signed in: {}, active call: {})",
            profile.is_some(),
            active.is_some()
        );

        let mut facade = Self {
            store,
            payments,
            clock,
            catalog: Catalog::default(),
            profile,
            calls: CallManager::new(active),
            notifications: NotificationCenter::new(),
        };

        match catalog_source.list_items().await {
            Ok(items) => {
                info!("Loaded {} catalog items", items.len());
                facade.catalog.replace(items);
            }
            Err(e) => {
                error!("Failed to load catalog: {}", e);
                facade.notify(CATALOG_LOAD_FAILED, NotificationCategory::Error).await;
            }
        }
        facade.end_expired_call().await;
        Ok(facade)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    //=====================================================================================
    // Identity
    //=====================================================================================

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }

    /// Creates a fresh profile, replacing whatever the durable slot held.
    pub async fn register(&mut self, identity: Identity) -> SessionResult<&Profile> {
        let welcome = format!("Welcome, {}!", identity.name);
        self.sign_in_fresh(identity).await;
        self.notify(welcome, NotificationCategory::Success).await;
        self.require_profile()
    }

    /// Same as `register` but without the welcome notification.
    pub async fn social_login(&mut self, identity: Identity) -> SessionResult<&Profile> {
        self.sign_in_fresh(identity).await;
        self.require_profile()
    }

    /// Signs in the profile stored in the durable slot when its email matches.
    /// There is a single slot, so only the last registered identity can log in.
    pub async fn login(&mut self, email: &str) -> bool {
        let stored = match self.store.load_profile().await {
            Ok(stored) => stored,
            Err(e) => {
                error!("Failed to read profile for login: {}", e);
                return false;
            }
        };
        match stored {
            Some(profile) if profile.email == email => {
                let welcome = format!("Welcome back, {}!", profile.name);
                self.profile = Some(profile);
                info!("Profile signed in");
                self.notify(welcome, NotificationCategory::Success).await;
                true
            }
            _ => {
                warn!("Login attempt did not match the stored profile");
                false
            }
        }
    }

    /// Clears the profile, the pending selection and the active call, in memory
    /// and in the durable slot.
    pub async fn logout(&mut self) {
        self.profile = None;
        self.calls.reset();
        self.notifications.reset();
        if let Err(e) = self.store.clear_profile().await {
            error!("Failed to clear stored profile: {}", e);
        }
        if let Err(e) = self.store.clear_active_call().await {
            error!("Failed to clear stored active call: {}", e);
        }
        info!("Profile signed out");
    }

    pub async fn update_profile(&mut self, name: String, bio: String) -> SessionResult<&Profile> {
        let profile = self.require_profile_mut()?;
        profile.name = name;
        profile.bio = Some(bio);
        self.notify("Profile details saved!", NotificationCategory::Success).await;
        self.require_profile()
    }

    pub async fn update_avatar(&mut self, url: String) -> SessionResult<&Profile> {
        let profile = self.require_profile_mut()?;
        profile.avatar = Some(url);
        self.notify("Profile picture updated!", NotificationCategory::Success).await;
        self.require_profile()
    }

    /// Moves the profile to `pending` verification with the submitted document.
    pub async fn submit_verification(&mut self, details: VerificationDetails) -> SessionResult<&Profile> {
        let profile = self.require_profile_mut()?;
        profile.verification_status = VerificationStatus::Pending;
        profile.verification_details = Some(details);
        self.notify(
            "Verification submitted. We will review it shortly.",
            NotificationCategory::Info,
        )
        .await;
        self.require_profile()
    }

    /// Completes a pending verification, but only if the same profile is still
    /// signed in and still pending.
    pub async fn complete_verification(&mut self, email: &str) -> bool {
        let Some(profile) = self.profile.as_mut() else {
            return false;
        };
        if profile.email != email || profile.verification_status != VerificationStatus::Pending {
            return false;
        }
        profile.verification_status = VerificationStatus::Verified;
        self.notify(
            "Your account has been successfully verified!",
            NotificationCategory::Success,
        )
        .await;
        true
    }

    //=====================================================================================
    // Notifications
    //=====================================================================================

    /// Best-effort side channel: does nothing when no profile is signed in.
    pub async fn notify(&mut self, message: impl Into<String>, category: NotificationCategory) -> Option<Notification> {
        let now = self.clock.now();
        let profile = self.profile.as_mut()?;
        let notification = self.notifications.push(profile, message, category, now);
        self.persist_profile().await;
        Some(notification)
    }

    pub async fn mark_read(&mut self, id: &str) {
        let changed = match self.profile.as_mut() {
            Some(profile) => self.notifications.mark_read(profile, id),
            None => false,
        };
        if changed {
            self.persist_profile().await;
        }
    }

    pub async fn mark_all_read(&mut self) {
        let changed = match self.profile.as_mut() {
            Some(profile) => self.notifications.mark_all_read(profile),
            None => false,
        };
        if changed {
            self.persist_profile().await;
        }
    }

    /// Hides a toast without acknowledging it. Not persisted.
    pub fn dismiss_toast(&mut self, id: &str) {
        self.notifications.dismiss_toast(id);
    }

    pub fn notifications(&self) -> &[Notification] {
        self.profile
            .as_ref()
            .map(|p| p.notifications.as_slice())
            .unwrap_or_default()
    }

    pub fn active_toasts(&self) -> Vec<&Notification> {
        self.notifications.active_toasts(self.profile.as_ref())
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.unread_count(self.profile.as_ref())
    }

    //=====================================================================================
    // Favorites
    //=====================================================================================

    /// Returns whether the item is a favorite after the toggle.
    pub async fn toggle_favorite(&mut self, item_id: &str) -> SessionResult<bool> {
        let profile = self.require_profile_mut()?;
        let change: FavoriteChange = favorites::toggle(profile, item_id);
        let (message, category) = change.notice();
        // `notify` persists the profile, favorites included.
        self.notify(message, category).await;
        Ok(change.is_favorite())
    }

    pub fn is_favorite(&self, item_id: &str) -> bool {
        favorites::is_favorite(self.profile.as_ref(), item_id)
    }

    pub fn favorite_items(&self) -> Vec<&CatalogItem> {
        favorites::favorite_items(self.profile.as_ref(), self.catalog.items())
    }

    //=====================================================================================
    // Catalog
    //=====================================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// One tick of the status simulator. Touches catalog records only.
    pub fn flip_catalog_statuses<R: Rng + ?Sized>(&mut self, rng: &mut R, probability: f64) -> Vec<ItemId> {
        self.catalog.flip_statuses(rng, probability)
    }

    //=====================================================================================
    // Cart, checkout and purchases
    //=====================================================================================

    pub async fn add_to_cart(&mut self, item_id: &str, offering_id: u32) -> SessionResult<Selection> {
        let selected = self
            .calls
            .select(&self.catalog, item_id, offering_id)
            .cloned();
        let selection = match selected {
            Ok(selection) => selection,
            Err(e) => return self.fail(e).await,
        };
        let message = format!("{} has been added to your bag.", selection.item.name);
        self.notify(message, NotificationCategory::Info).await;
        Ok(selection)
    }

    pub fn cart(&self) -> Option<&Selection> {
        self.calls.cart()
    }

    pub fn clear_cart(&mut self) {
        self.calls.clear_cart();
    }

    /// Charges the pending selection and, only on success, records the purchase.
    pub async fn checkout(&mut self, customer: CustomerDetails, card: CardDetails) -> SessionResult<Purchase> {
        if self.profile.is_none() {
            return self.fail(SessionError::NotAuthenticated).await;
        }
        let Some(selection) = self.calls.cart().cloned() else {
            return self.fail(SessionError::EmptySelection).await;
        };

        let request = PaymentRequest {
            amount_cents: selection.offering.price_cents(),
            title: format!(
                "{}-Minute Call with {}",
                selection.offering.duration_minutes, selection.item.name
            ),
            payer: customer,
            card,
            offering: selection.offering.clone(),
        };
        match self.payments.charge(&request).await {
            Ok(receipt) => {
                info!("Payment accepted (transaction: {:?})", receipt.transaction_id);
            }
            Err(PortError::Rejected(reason)) => {
                warn!("Payment rejected: {}", reason);
                return self.fail(SessionError::PaymentRejected(reason)).await;
            }
            Err(e) => {
                error!("Payment collaborator failed: {}", e);
                return self.fail(SessionError::PaymentRejected(PAYMENT_FAILED.to_string())).await;
            }
        }

        let purchase = self.purchase(&selection).await?;
        self.notify("Payment successful! Your call is starting.", NotificationCategory::Success)
            .await;
        Ok(purchase)
    }

    /// Records a paid selection in the history and makes it the active call.
    pub async fn purchase(&mut self, selection: &Selection) -> SessionResult<Purchase> {
        let now = self.clock.now();
        let purchase = match self.calls.purchase(self.profile.as_mut(), selection, now) {
            Ok(purchase) => purchase,
            Err(e) => return self.fail(e).await,
        };
        info!(
            "Purchase recorded for item {} at {}",
            purchase.item.id,
            purchase.purchased_at.timestamp_millis()
        );
        self.persist_profile().await;
        self.persist_active_call().await;
        Ok(purchase)
    }

    pub fn purchase_history(&self) -> &[Purchase] {
        self.profile
            .as_ref()
            .map(|p| p.purchase_history.as_slice())
            .unwrap_or_default()
    }

    //=====================================================================================
    // Calls
    //=====================================================================================

    pub fn active_call(&self) -> Option<ActiveCall> {
        self.calls.active()
    }

    /// The active call with its state derived at the current time.
    pub fn active_call_view(&self) -> Option<ActiveCallView> {
        self.calls
            .active_state(self.profile.as_ref(), self.clock.now())
            .map(|(purchase, state)| ActiveCallView {
                purchase: purchase.clone(),
                state,
            })
    }

    /// The state of any purchase in the history at the current time.
    pub fn call_state(&self, purchased_at: DateTime<Utc>) -> Option<CallState> {
        let purchase = self.profile.as_ref()?.purchase(purchased_at)?;
        Some(derive_call_state(purchase, self.clock.now()))
    }

    /// Points the active call at a purchase from the history (rejoin).
    pub async fn set_active_call(&mut self, purchased_at: DateTime<Utc>) -> SessionResult<ActiveCall> {
        let result = match self.profile.as_ref() {
            Some(profile) => self.calls.set_active(profile, purchased_at),
            None => Err(SessionError::NotAuthenticated),
        };
        match result {
            Ok(call) => {
                self.persist_active_call().await;
                Ok(call)
            }
            Err(e) => self.fail(e).await,
        }
    }

    /// Ends the rejoinable call; the purchase history is untouched.
    pub async fn clear_active_call(&mut self) {
        if self.calls.clear_active().is_some() {
            self.persist_active_call().await;
        }
    }

    pub async fn submit_feedback(
        &mut self,
        purchased_at: DateTime<Utc>,
        rating: u8,
        comment: &str,
    ) -> SessionResult<Review> {
        let now = self.clock.now();
        let result = match self.profile.as_mut() {
            Some(profile) => {
                self.calls
                    .submit_feedback(profile, &mut self.catalog, purchased_at, rating, comment, now)
            }
            None => Err(SessionError::NotAuthenticated),
        };
        match result {
            Ok(review) => {
                info!("Feedback filed as review {}", review.id);
                self.persist_profile().await;
                Ok(review)
            }
            Err(e) => self.fail(e).await,
        }
    }

    //=====================================================================================
    // Moderation
    //=====================================================================================

    pub fn pending_reviews(&self) -> Vec<PendingReview> {
        moderation::list_pending(&self.catalog)
    }

    pub async fn decide_review(
        &mut self,
        item_id: &str,
        review_id: &str,
        decision: ModerationDecision,
    ) -> SessionResult<Review> {
        let review = match moderation::decide(&mut self.catalog, item_id, review_id, decision) {
            Ok(review) => review,
            Err(e) => return self.fail(e).await,
        };
        info!("Review {} on {} {}", review_id, item_id, decision.as_str());
        let message = format!("Review has been {}.", decision.as_str());
        self.notify(message, NotificationCategory::Success).await;
        Ok(review)
    }

    pub async fn add_trusted_review(&mut self, item_id: &str, review: TrustedReview) -> SessionResult<Review> {
        let now = self.clock.now();
        match moderation::add_trusted_review(&mut self.catalog, item_id, review, now) {
            Ok(review) => {
                info!("Trusted review {} added to {}", review.id, item_id);
                Ok(review)
            }
            Err(e) => self.fail(e).await,
        }
    }

    pub fn public_reviews(&self, item_id: &str) -> SessionResult<Vec<&Review>> {
        let item = self
            .catalog
            .item(item_id)
            .ok_or_else(|| SessionError::ItemNotFound(item_id.to_string()))?;
        Ok(moderation::public_reviews(item))
    }

    pub fn public_average(&self, item_id: &str) -> SessionResult<f64> {
        let item = self
            .catalog
            .item(item_id)
            .ok_or_else(|| SessionError::ItemNotFound(item_id.to_string()))?;
        Ok(moderation::public_average(item))
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    async fn sign_in_fresh(&mut self, identity: Identity) {
        self.profile = Some(Profile::new(identity));
        self.notifications.reset();
        info!("Fresh profile created");
        self.persist_profile().await;
    }

    async fn end_expired_call(&mut self) {
        let expired = matches!(
            self.calls.active_state(self.profile.as_ref(), self.clock.now()),
            Some((_, CallState::Completed))
        );
        if !expired {
            return;
        }
        self.calls.clear_active();
        info!("Restored call had already ended; pointer cleared");
        self.persist_active_call().await;
        self.notify(PREVIOUS_CALL_ENDED, NotificationCategory::Info).await;
    }

    fn require_profile(&self) -> SessionResult<&Profile> {
        self.profile.as_ref().ok_or(SessionError::NotAuthenticated)
    }

    fn require_profile_mut(&mut self) -> SessionResult<&mut Profile> {
        self.profile.as_mut().ok_or(SessionError::NotAuthenticated)
    }

    /// Surfaces a user-facing failure as an error notification, then returns it.
    async fn fail<T>(&mut self, err: SessionError) -> SessionResult<T> {
        if err.is_caller_error() {
            self.notify(err.to_string(), NotificationCategory::Error).await;
        }
        Err(err)
    }

    async fn persist_profile(&self) {
        let Some(profile) = self.profile.as_ref() else {
            return;
        };
        if let Err(e) = self.store.save_profile(profile).await {
            error!("Failed to persist profile: {}", e);
        }
    }

    async fn persist_active_call(&self) {
        let result = match self.calls.active() {
            Some(call) => self.store.save_active_call(&call).await,
            None => self.store.clear_active_call().await,
        };
        if let Err(e) = result {
            error!("Failed to persist active call: {}", e);
        }
    }
}
