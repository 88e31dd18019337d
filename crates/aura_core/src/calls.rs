//! crates/aura_core/src/calls.rs
//!
//! Purchase and call lifecycle: the pending selection, the purchase history
//! entries it turns into, the active-call pointer and post-call feedback.
//!
//! A call has no "end" event. Whether it is still running is derived from the
//! wall clock on every observation and never stored.

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;
use crate::domain::{
    purchase_instant, ActiveCall, CallState, Profile, Purchase, Review, ReviewStatus, Selection,
};
use crate::error::{SessionError, SessionResult};
use crate::moderation;

/// Derives the temporal state of a purchase at `now`.
///
/// `completed ⇔ now ≥ purchased_at + duration`, so once this returns
/// `Completed` for a purchase it does so for every later `now`. A call whose
/// end has already passed (e.g. the client was away for the whole window)
/// reports `Completed`, never a negative remainder.
pub fn derive_call_state(purchase: &Purchase, now: DateTime<Utc>) -> CallState {
    let remaining_ms = (purchase.ends_at() - now).num_milliseconds();
    if remaining_ms <= 0 {
        CallState::Completed
    } else {
        CallState::Active { remaining_ms }
    }
}

#[derive(Debug, Default)]
pub struct CallManager {
    cart: Option<Selection>,
    active: Option<ActiveCall>,
}

impl CallManager {
    pub fn new(active: Option<ActiveCall>) -> Self {
        Self { cart: None, active }
    }

    //=====================================================================================
    // Pending selection
    //=====================================================================================

    /// Snapshots an item and one of its offerings as the pending selection,
    /// replacing any previous one. The snapshot carries public reviews only.
    pub fn select(&mut self, catalog: &Catalog, item_id: &str, offering_id: u32) -> SessionResult<&Selection> {
        let item = catalog
            .item(item_id)
            .ok_or_else(|| SessionError::ItemNotFound(item_id.to_string()))?;
        let offering = item
            .offering(offering_id)
            .ok_or_else(|| SessionError::InvalidSelection {
                item_id: item_id.to_string(),
                offering_id,
            })?;
        let selection = Selection {
            item: moderation::public_snapshot(item),
            offering: offering.clone(),
        };
        Ok(&*self.cart.insert(selection))
    }

    pub fn cart(&self) -> Option<&Selection> {
        self.cart.as_ref()
    }

    pub fn clear_cart(&mut self) {
        self.cart = None;
    }

    //=====================================================================================
    // Purchases
    //=====================================================================================

    /// Records a paid selection: appends it to the history, points the active call
    /// at it and clears the pending selection.
    pub fn purchase(
        &mut self,
        profile: Option<&mut Profile>,
        selection: &Selection,
        now: DateTime<Utc>,
    ) -> SessionResult<Purchase> {
        let profile = profile.ok_or(SessionError::NotAuthenticated)?;
        validate_selection(selection)?;

        let purchase = Purchase {
            item: moderation::public_snapshot(&selection.item),
            offering: selection.offering.clone(),
            purchased_at: purchase_instant(now),
            feedback_submitted: false,
        };
        profile.purchase_history.push(purchase.clone());
        self.active = Some(ActiveCall {
            purchased_at: purchase.purchased_at,
        });
        self.cart = None;
        Ok(purchase)
    }

    //=====================================================================================
    // Active call pointer
    //=====================================================================================

    pub fn active(&self) -> Option<ActiveCall> {
        self.active
    }

    /// Resolves the pointer against the purchase history.
    pub fn active_purchase<'a>(&self, profile: Option<&'a Profile>) -> Option<&'a Purchase> {
        let active = self.active?;
        profile?.purchase(active.purchased_at)
    }

    /// Repoints the active call at any purchase in the history (rejoin).
    pub fn set_active(&mut self, profile: &Profile, purchased_at: DateTime<Utc>) -> SessionResult<ActiveCall> {
        let purchase = profile
            .purchase(purchased_at)
            .ok_or(SessionError::PurchaseNotFound(purchased_at.timestamp_millis()))?;
        let call = ActiveCall {
            purchased_at: purchase.purchased_at,
        };
        self.active = Some(call);
        Ok(call)
    }

    /// Drops the pointer; the purchase history is untouched.
    pub fn clear_active(&mut self) -> Option<ActiveCall> {
        self.active.take()
    }

    /// The active call's purchase and its state at `now`.
    pub fn active_state<'a>(&self, profile: Option<&'a Profile>, now: DateTime<Utc>) -> Option<(&'a Purchase, CallState)> {
        self.active_purchase(profile)
            .map(|purchase| (purchase, derive_call_state(purchase, now)))
    }

    /// Forgets the selection and the pointer, e.g. on logout.
    pub fn reset(&mut self) {
        self.cart = None;
        self.active = None;
    }

    //=====================================================================================
    // Feedback
    //=====================================================================================

    /// Files a pending review for the purchased item and flags the purchase.
    ///
    /// A second submission for the same purchase still files its review; keeping
    /// the form hidden once `feedback_submitted` is set is the caller's job.
    pub fn submit_feedback(
        &mut self,
        profile: &mut Profile,
        catalog: &mut Catalog,
        purchased_at: DateTime<Utc>,
        rating: u8,
        comment: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<Review> {
        if rating > 5 {
            return Err(SessionError::InvalidRating(rating));
        }
        let comment = comment.trim();
        if rating == 0 && comment.is_empty() {
            return Err(SessionError::EmptyFeedback);
        }
        let item_id = profile
            .purchase(purchased_at)
            .map(|p| p.item.id.clone())
            .ok_or(SessionError::PurchaseNotFound(purchased_at.timestamp_millis()))?;

        let review = Review {
            id: moderation::review_id(now),
            author: profile.name.clone(),
            rating,
            comment: comment.to_string(),
            status: ReviewStatus::Pending,
            avatar: profile.avatar.clone(),
            response: None,
            hidden: false,
        };
        let review = moderation::push_review(catalog, &item_id, review)?;

        if let Some(purchase) = profile.purchase_mut(purchased_at) {
            purchase.feedback_submitted = true;
        }
        Ok(review)
    }
}

fn validate_selection(selection: &Selection) -> SessionResult<()> {
    if selection.item.offering(selection.offering.id).is_none() {
        return Err(SessionError::InvalidSelection {
            item_id: selection.item.id.clone(),
            offering_id: selection.offering.id,
        });
    }
    Ok(())
}
