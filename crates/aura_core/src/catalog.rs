//! crates/aura_core/src/catalog.rs
//!
//! The session's local copy of the catalog collaborator's records.
//! Review moderation mutates the review arrays held here as a local echo of
//! what a real backend would persist.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{CatalogItem, ItemId, ItemStatus};
use crate::moderation::public_average;

/// Age brackets the storefront filters by. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-29")]
    From25To29,
    #[serde(rename = "30-99")]
    From30,
}

impl AgeRange {
    pub fn bounds(self) -> (u32, u32) {
        match self {
            AgeRange::From18To24 => (18, 24),
            AgeRange::From25To29 => (25, 29),
            AgeRange::From30 => (30, 99),
        }
    }

    pub fn contains(self, age: u32) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&age)
    }
}

/// Ordering applied after online items have been moved to the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    #[default]
    Status,
    /// Public average rating, highest first.
    Rating,
    /// Cheapest offering, lowest first.
    PriceAsc,
    /// Most expensive offering, highest first.
    PriceDesc,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut CatalogItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn replace(&mut self, items: Vec<CatalogItem>) {
        self.items = items;
    }

    /// The storefront listing: online items first, optionally narrowed to an
    /// age bracket, then ordered by `sort`. All sorts are stable, so ties keep
    /// online items ahead and otherwise preserve catalog order.
    pub fn browse(&self, age: Option<AgeRange>, sort: CatalogSort) -> Vec<&CatalogItem> {
        let mut items: Vec<&CatalogItem> = self
            .items
            .iter()
            .filter(|item| age.map_or(true, |range| range.contains(item.age)))
            .collect();
        items.sort_by_key(|item| item.status != ItemStatus::Online);
        match sort {
            CatalogSort::Status => {}
            CatalogSort::Rating => items.sort_by(|a, b| public_average(b).total_cmp(&public_average(a))),
            CatalogSort::PriceAsc => items.sort_by(|a, b| min_price(a).total_cmp(&min_price(b))),
            CatalogSort::PriceDesc => items.sort_by(|a, b| max_price(b).total_cmp(&max_price(a))),
        }
        items
    }

    /// Each item independently flips online/offline with `probability`.
    /// Returns the ids that changed.
    pub fn flip_statuses<R: Rng + ?Sized>(&mut self, rng: &mut R, probability: f64) -> Vec<ItemId> {
        let probability = probability.clamp(0.0, 1.0);
        let mut flipped = Vec::new();
        for item in &mut self.items {
            if rng.gen_bool(probability) {
                item.status = item.status.toggled();
                flipped.push(item.id.clone());
            }
        }
        flipped
    }
}

// Items without offerings sort last in both price orders.
fn min_price(item: &CatalogItem) -> f64 {
    item.offerings.iter().map(|o| o.price).fold(f64::INFINITY, f64::min)
}

fn max_price(item: &CatalogItem) -> f64 {
    item.offerings.iter().map(|o| o.price).fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Offering, ReviewStatus};
    use crate::test_support::{review, sample_item};
    use rand::{rngs::StdRng, SeedableRng};

    fn item(id: &str, age: u32, status: ItemStatus, prices: &[f64]) -> CatalogItem {
        let mut item = sample_item(id);
        item.age = age;
        item.status = status;
        let template = item.offerings[0].clone();
        item.offerings = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Offering {
                id: i as u32 + 1,
                price,
                ..template.clone()
            })
            .collect();
        item
    }

    fn storefront() -> Catalog {
        let mut cheap = item("cheap", 22, ItemStatus::Offline, &[9.9, 120.0]);
        cheap.reviews = vec![review("review-0000000000001-a", 5, ReviewStatus::Approved)];
        let mut rated = item("rated", 27, ItemStatus::Online, &[19.9, 49.9]);
        rated.reviews = vec![
            review("review-0000000000002-a", 4, ReviewStatus::Approved),
            review("review-0000000000003-a", 5, ReviewStatus::Pending),
        ];
        let mut lead = review("review-0000000000004-a", 5, ReviewStatus::Approved);
        lead.hidden = true;
        let mut senior = item("senior", 34, ItemStatus::Online, &[29.9]);
        senior.reviews = vec![review("review-0000000000005-a", 3, ReviewStatus::Approved), lead];
        let bare = item("bare", 24, ItemStatus::Online, &[]);
        Catalog::new(vec![cheap, rated, senior, bare])
    }

    fn ids(items: Vec<&CatalogItem>) -> Vec<&str> {
        items.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn default_listing_puts_online_first_in_catalog_order() {
        let catalog = storefront();

        assert_eq!(
            ids(catalog.browse(None, CatalogSort::Status)),
            vec!["rated", "senior", "bare", "cheap"]
        );
    }

    #[test]
    fn age_brackets_are_inclusive() {
        let catalog = storefront();

        assert_eq!(ids(catalog.browse(Some(AgeRange::From18To24), CatalogSort::Status)), vec!["bare", "cheap"]);
        assert_eq!(ids(catalog.browse(Some(AgeRange::From25To29), CatalogSort::Status)), vec!["rated"]);
        assert_eq!(ids(catalog.browse(Some(AgeRange::From30), CatalogSort::Status)), vec!["senior"]);
        assert!(AgeRange::From30.contains(99));
        assert!(!AgeRange::From18To24.contains(17));
    }

    #[test]
    fn rating_sort_uses_public_reviews_only() {
        let catalog = storefront();

        // senior's hidden 5 and rated's pending 5 do not count.
        assert_eq!(
            ids(catalog.browse(None, CatalogSort::Rating)),
            vec!["cheap", "rated", "senior", "bare"]
        );
    }

    #[test]
    fn price_sorts_use_cheapest_and_dearest_offering() {
        let catalog = storefront();

        assert_eq!(
            ids(catalog.browse(None, CatalogSort::PriceAsc)),
            vec!["cheap", "rated", "senior", "bare"]
        );
        assert_eq!(
            ids(catalog.browse(None, CatalogSort::PriceDesc)),
            vec!["cheap", "rated", "senior", "bare"]
        );
    }

    #[test]
    fn price_ties_keep_online_items_ahead() {
        let catalog = Catalog::new(vec![
            item("off", 25, ItemStatus::Offline, &[10.0]),
            item("on", 25, ItemStatus::Online, &[10.0]),
        ]);

        assert_eq!(ids(catalog.browse(None, CatalogSort::PriceAsc)), vec!["on", "off"]);
        assert_eq!(ids(catalog.browse(None, CatalogSort::PriceDesc)), vec!["on", "off"]);
    }

    #[test]
    fn query_values_parse_from_their_wire_names() {
        let range: AgeRange = serde_json::from_str("\"30-99\"").unwrap();
        let sort: CatalogSort = serde_json::from_str("\"price_desc\"").unwrap();

        assert_eq!(range, AgeRange::From30);
        assert_eq!(sort, CatalogSort::PriceDesc);
    }

    #[test]
    fn certain_flip_toggles_every_item() {
        let mut catalog = Catalog::new(vec![sample_item("m1"), sample_item("m2")]);
        let mut rng = StdRng::seed_from_u64(7);

        let flipped = catalog.flip_statuses(&mut rng, 1.0);

        assert_eq!(flipped, vec!["m1".to_string(), "m2".to_string()]);
        assert!(catalog.items().iter().all(|i| i.status == ItemStatus::Offline));
    }

    #[test]
    fn zero_probability_changes_nothing() {
        let mut catalog = Catalog::new(vec![sample_item("m1")]);
        let mut rng = StdRng::seed_from_u64(7);

        assert!(catalog.flip_statuses(&mut rng, 0.0).is_empty());
        assert_eq!(catalog.item("m1").map(|i| i.status), Some(ItemStatus::Online));
    }

    #[test]
    fn out_of_range_probability_is_clamped() {
        let mut catalog = Catalog::new(vec![sample_item("m1")]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(catalog.flip_statuses(&mut rng, 3.5).len(), 1);
    }
}
