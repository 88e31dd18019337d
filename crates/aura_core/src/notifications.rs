//! crates/aura_core/src/notifications.rs
//!
//! The notification log attached to a profile and the toast projection over it.
//!
//! The log is append-only: entries are never deleted, only flipped to read.
//! Toasts are not stored; they are recomputed on every read as the unread
//! entries whose ids are not in the per-session dismissed set. Dismissing a
//! toast hides it without acknowledging it, so it still counts as unread.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{Notification, NotificationCategory, Profile};

/// Builds an id from the creation time plus randomness. Ids sort by creation time.
pub(crate) fn timestamped_id(now: DateTime<Utc>) -> String {
    format!("{:013}-{}", now.timestamp_millis(), Uuid::new_v4().simple())
}

#[derive(Debug, Default)]
pub struct NotificationCenter {
    dismissed: HashSet<String>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new unread notification and returns it.
    pub fn push(
        &self,
        profile: &mut Profile,
        message: impl Into<String>,
        category: NotificationCategory,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = Notification {
            id: timestamped_id(now),
            message: message.into(),
            category,
            read: false,
        };
        profile.notifications.push(notification.clone());
        notification
    }

    /// Returns `true` if a notification actually flipped to read.
    pub fn mark_read(&self, profile: &mut Profile, id: &str) -> bool {
        match profile
            .notifications
            .iter_mut()
            .find(|n| n.id == id && !n.read)
        {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if at least one notification flipped to read.
    pub fn mark_all_read(&self, profile: &mut Profile) -> bool {
        let mut changed = false;
        for notification in profile.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed = true;
        }
        changed
    }

    /// Hides a toast for the rest of this session. Never touches `read`.
    pub fn dismiss_toast(&mut self, id: &str) {
        self.dismissed.insert(id.to_string());
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed.contains(id)
    }

    /// Forgets every dismissal, e.g. when the session ends.
    pub fn reset(&mut self) {
        self.dismissed.clear();
    }

    /// The notifications that should currently render as toasts: `unread ∧ ¬dismissed`.
    pub fn active_toasts<'a>(&self, profile: Option<&'a Profile>) -> Vec<&'a Notification> {
        profile
            .map(|p| {
                p.notifications
                    .iter()
                    .filter(|n| !n.read && !self.dismissed.contains(&n.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn unread_count(&self, profile: Option<&Profile>) -> usize {
        profile
            .map(|p| p.notifications.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::test_support::at;

    fn profile() -> Profile {
        Profile::new(Identity {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar: None,
        })
    }

    #[test]
    fn dismissed_toast_stays_unread_and_listed() {
        let mut center = NotificationCenter::new();
        let mut profile = profile();
        let n = center.push(&mut profile, "X", NotificationCategory::Success, at(10));

        center.dismiss_toast(&n.id);

        assert!(center.active_toasts(Some(&profile)).is_empty());
        assert_eq!(profile.notifications.len(), 1);
        assert!(!profile.notifications[0].read);
        assert_eq!(center.unread_count(Some(&profile)), 1);
    }

    #[test]
    fn mark_read_removes_from_toasts() {
        let center = NotificationCenter::new();
        let mut profile = profile();
        let first = center.push(&mut profile, "a", NotificationCategory::Info, at(1));
        let second = center.push(&mut profile, "b", NotificationCategory::Error, at(2));

        assert!(center.mark_read(&mut profile, &first.id));

        let toasts: Vec<_> = center
            .active_toasts(Some(&profile))
            .into_iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(toasts, vec![second.id]);
    }

    #[test]
    fn mark_read_is_a_noop_for_unknown_or_read_ids() {
        let center = NotificationCenter::new();
        let mut profile = profile();
        let n = center.push(&mut profile, "a", NotificationCategory::Info, at(1));

        assert!(!center.mark_read(&mut profile, "missing"));
        assert!(center.mark_read(&mut profile, &n.id));
        assert!(!center.mark_read(&mut profile, &n.id));
    }

    #[test]
    fn mark_all_read_reports_whether_anything_changed() {
        let center = NotificationCenter::new();
        let mut profile = profile();
        assert!(!center.mark_all_read(&mut profile));

        center.push(&mut profile, "a", NotificationCategory::Info, at(1));
        center.push(&mut profile, "b", NotificationCategory::Info, at(2));

        assert!(center.mark_all_read(&mut profile));
        assert_eq!(center.unread_count(Some(&profile)), 0);
        assert!(!center.mark_all_read(&mut profile));
    }

    #[test]
    fn no_profile_means_no_toasts() {
        let center = NotificationCenter::new();
        assert!(center.active_toasts(None).is_empty());
        assert_eq!(center.unread_count(None), 0);
    }

    #[test]
    fn ids_are_unique_within_one_millisecond() {
        let center = NotificationCenter::new();
        let mut profile = profile();
        let a = center.push(&mut profile, "a", NotificationCategory::Info, at(5));
        let b = center.push(&mut profile, "b", NotificationCategory::Info, at(5));

        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("0000000000005-"));
    }
}
