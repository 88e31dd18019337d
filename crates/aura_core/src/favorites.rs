//! crates/aura_core/src/favorites.rs
//!
//! The per-profile set of favorite catalog items.

use crate::domain::{CatalogItem, NotificationCategory, Profile};

/// The membership change made by a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Added,
    Removed,
}

impl FavoriteChange {
    pub fn is_favorite(&self) -> bool {
        matches!(self, FavoriteChange::Added)
    }

    /// The notification describing the new state.
    pub fn notice(&self) -> (&'static str, NotificationCategory) {
        match self {
            FavoriteChange::Added => ("Added to favorites!", NotificationCategory::Success),
            FavoriteChange::Removed => ("Removed from favorites.", NotificationCategory::Info),
        }
    }
}

/// Flips membership of `item_id`. Toggling twice restores the original set.
pub fn toggle(profile: &mut Profile, item_id: &str) -> FavoriteChange {
    if profile.favorites.remove(item_id) {
        FavoriteChange::Removed
    } else {
        profile.favorites.insert(item_id.to_string());
        FavoriteChange::Added
    }
}

pub fn is_favorite(profile: Option<&Profile>, item_id: &str) -> bool {
    profile.is_some_and(|p| p.favorites.contains(item_id))
}

/// Catalog items that are favorites, in catalog order. Ids the catalog no longer
/// carries are skipped.
pub fn favorite_items<'a>(profile: Option<&Profile>, items: &'a [CatalogItem]) -> Vec<&'a CatalogItem> {
    match profile {
        Some(p) => items.iter().filter(|i| p.favorites.contains(&i.id)).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::test_support::sample_item;

    fn profile() -> Profile {
        Profile::new(Identity {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            avatar: None,
        })
    }

    #[test]
    fn double_toggle_restores_membership() {
        let mut p = profile();
        p.favorites.insert("keep".to_string());
        let before = p.favorites.clone();

        assert_eq!(toggle(&mut p, "m1"), FavoriteChange::Added);
        assert!(is_favorite(Some(&p), "m1"));
        assert_eq!(toggle(&mut p, "m1"), FavoriteChange::Removed);

        assert_eq!(p.favorites, before);
    }

    #[test]
    fn anonymous_has_no_favorites() {
        assert!(!is_favorite(None, "m1"));
        assert!(favorite_items(None, &[sample_item("m1")]).is_empty());
    }

    #[test]
    fn favorite_items_follow_the_catalog() {
        let mut p = profile();
        toggle(&mut p, "m2");
        toggle(&mut p, "gone");
        let items = vec![sample_item("m1"), sample_item("m2")];

        let ids: Vec<_> = favorite_items(Some(&p), &items)
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();

        assert_eq!(ids, vec!["m2"]);
    }
}
