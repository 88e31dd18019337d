//! crates/aura_core/src/moderation.rs
//!
//! Review moderation: a cross-cutting view over every catalog item's reviews.
//!
//! Customer reviews enter as `pending`; operators move them to `approved` or
//! `rejected`. Re-deciding an already decided review is permitted (operator
//! override). Public listings and averages only ever see approved, non-hidden
//! reviews.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::domain::{CatalogItem, ModerationDecision, PendingReview, Review, ReviewStatus};
use crate::error::{SessionError, SessionResult};

/// An operator-authored review that skips the pending stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedReview {
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub hide_from_public: bool,
    pub avatar: Option<String>,
}

pub(crate) fn review_id(now: DateTime<Utc>) -> String {
    format!("review-{:013}-{}", now.timestamp_millis(), Uuid::new_v4().simple())
}

/// All pending reviews across the catalog, newest first.
pub fn list_pending(catalog: &Catalog) -> Vec<PendingReview> {
    let mut pending: Vec<PendingReview> = catalog
        .items()
        .iter()
        .flat_map(|item| {
            item.reviews
                .iter()
                .filter(|r| r.status == ReviewStatus::Pending)
                .map(move |r| PendingReview {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    review: r.clone(),
                })
        })
        .collect();
    // Ids embed a zero-padded creation time, so reverse id order is newest first.
    pending.sort_by(|a, b| b.review.id.cmp(&a.review.id));
    pending
}

/// Moves a review to `approved` or `rejected`.
pub fn decide(
    catalog: &mut Catalog,
    item_id: &str,
    review_id: &str,
    decision: ModerationDecision,
) -> SessionResult<Review> {
    let review = catalog
        .item_mut(item_id)
        .and_then(|item| item.reviews.iter_mut().find(|r| r.id == review_id))
        .ok_or_else(|| SessionError::ReviewNotFound {
            item_id: item_id.to_string(),
            review_id: review_id.to_string(),
        })?;
    review.status = decision.into();
    Ok(review.clone())
}

/// Appends an already approved review written by a trusted operator.
pub fn add_trusted_review(
    catalog: &mut Catalog,
    item_id: &str,
    trusted: TrustedReview,
    now: DateTime<Utc>,
) -> SessionResult<Review> {
    if trusted.rating > 5 {
        return Err(SessionError::InvalidRating(trusted.rating));
    }
    let review = Review {
        id: review_id(now),
        author: trusted.author,
        rating: trusted.rating,
        comment: trusted.comment,
        status: ReviewStatus::Approved,
        avatar: trusted.avatar.filter(|a| !a.is_empty()),
        response: None,
        hidden: trusted.hide_from_public,
    };
    push_review(catalog, item_id, review)
}

/// Appends a review to an item's collection.
pub(crate) fn push_review(catalog: &mut Catalog, item_id: &str, review: Review) -> SessionResult<Review> {
    let item = catalog
        .item_mut(item_id)
        .ok_or_else(|| SessionError::ItemNotFound(item_id.to_string()))?;
    item.reviews.push(review.clone());
    Ok(review)
}

/// The reviews shown to the public, in stored order.
pub fn public_reviews(item: &CatalogItem) -> Vec<&Review> {
    item.reviews.iter().filter(|r| r.is_public()).collect()
}

/// A copy of `item` carrying only its public reviews, for snapshots that
/// leave the catalog (selections, purchases).
pub fn public_snapshot(item: &CatalogItem) -> CatalogItem {
    CatalogItem {
        reviews: public_reviews(item).into_iter().cloned().collect(),
        ..item.clone()
    }
}

/// Mean rating over the public reviews; `0.0` when there are none.
pub fn public_average(item: &CatalogItem) -> f64 {
    let visible = public_reviews(item);
    if visible.is_empty() {
        return 0.0;
    }
    let total: u32 = visible.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(total) / visible.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, review, sample_item};

    fn catalog() -> Catalog {
        let mut m1 = sample_item("m1");
        m1.reviews = vec![
            review("review-0000000000001-a", 5, ReviewStatus::Approved),
            review("review-0000000000002-a", 1, ReviewStatus::Pending),
        ];
        let mut m2 = sample_item("m2");
        m2.reviews = vec![review("review-0000000000003-a", 2, ReviewStatus::Pending)];
        Catalog::new(vec![m1, m2])
    }

    #[test]
    fn pending_queue_spans_items_newest_first() {
        let pending = list_pending(&catalog());

        let ids: Vec<_> = pending.iter().map(|p| p.review.id.as_str()).collect();
        assert_eq!(ids, vec!["review-0000000000003-a", "review-0000000000002-a"]);
        assert_eq!(pending[0].item_id, "m2");
    }

    #[test]
    fn decide_transitions_and_leaves_queue() {
        let mut catalog = catalog();

        let decided = decide(&mut catalog, "m1", "review-0000000000002-a", ModerationDecision::Rejected).unwrap();

        assert_eq!(decided.status, ReviewStatus::Rejected);
        assert_eq!(list_pending(&catalog).len(), 1);
    }

    #[test]
    fn decide_requires_review_under_that_item() {
        let mut catalog = catalog();

        let err = decide(&mut catalog, "m2", "review-0000000000002-a", ModerationDecision::Approved).unwrap_err();

        assert!(matches!(err, SessionError::ReviewNotFound { .. }));
    }

    #[test]
    fn re_deciding_is_permitted() {
        let mut catalog = catalog();
        decide(&mut catalog, "m1", "review-0000000000002-a", ModerationDecision::Approved).unwrap();

        let again = decide(&mut catalog, "m1", "review-0000000000002-a", ModerationDecision::Rejected).unwrap();

        assert_eq!(again.status, ReviewStatus::Rejected);
    }

    #[test]
    fn average_ignores_pending_rejected_and_hidden() {
        let mut catalog = catalog();
        let before = public_average(catalog.item("m1").unwrap());

        let item = catalog.item_mut("m1").unwrap();
        item.reviews.push(review("review-0000000000004-a", 1, ReviewStatus::Rejected));
        item.reviews.push(review("review-0000000000006-a", 1, ReviewStatus::Pending));
        add_trusted_review(
            &mut catalog,
            "m1",
            TrustedReview {
                author: "Lead".to_string(),
                rating: 1,
                comment: "hidden".to_string(),
                hide_from_public: true,
                avatar: None,
            },
            at(9),
        )
        .unwrap();

        assert_eq!(public_average(catalog.item("m1").unwrap()), before);
        assert_eq!(before, 5.0);
    }

    #[test]
    fn visible_approved_review_moves_the_average() {
        let mut catalog = catalog();
        add_trusted_review(
            &mut catalog,
            "m1",
            TrustedReview {
                author: "Op".to_string(),
                rating: 3,
                comment: "fine".to_string(),
                hide_from_public: false,
                avatar: Some(String::new()),
            },
            at(9),
        )
        .unwrap();

        let item = catalog.item("m1").unwrap();
        assert_eq!(public_average(item), 4.0);
        assert_eq!(public_reviews(item).len(), 2);
        assert_eq!(public_reviews(item)[1].avatar, None);
    }

    #[test]
    fn approving_a_hidden_review_keeps_it_private() {
        let mut catalog = catalog();
        let item = catalog.item_mut("m1").unwrap();
        let mut lead = review("review-0000000000005-a", 1, ReviewStatus::Pending);
        lead.hidden = true;
        item.reviews.push(lead);

        decide(&mut catalog, "m1", "review-0000000000005-a", ModerationDecision::Approved).unwrap();

        let item = catalog.item("m1").unwrap();
        assert!(public_reviews(item).iter().all(|r| r.id != "review-0000000000005-a"));
        assert_eq!(public_average(item), 5.0);
    }

    #[test]
    fn snapshot_keeps_only_public_reviews() {
        let mut catalog = catalog();
        add_trusted_review(
            &mut catalog,
            "m1",
            TrustedReview {
                author: "Lead".to_string(),
                rating: 2,
                comment: "hidden".to_string(),
                hide_from_public: true,
                avatar: None,
            },
            at(9),
        )
        .unwrap();

        let snapshot = public_snapshot(catalog.item("m1").unwrap());

        let ids: Vec<_> = snapshot.reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["review-0000000000001-a"]);
        assert_eq!(snapshot.offerings, catalog.item("m1").unwrap().offerings);
    }

    #[test]
    fn empty_public_set_averages_to_zero() {
        assert_eq!(public_average(&sample_item("m9")), 0.0);
    }
}
