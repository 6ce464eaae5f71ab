//! Matching and ranking of marketplace listings against a scraped item

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fuzzy;
use crate::model::{Comparison, Item, Listing};

/// Listings scoring at or above this are not considered the same product.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Exclusive upper bound on the fuzzy score of an accepted match
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_MATCH_THRESHOLD
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Pairs an item with cheaper listings of the same product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    threshold: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_MATCH_THRESHOLD)
    }
}

impl Matcher {
    pub fn new(config: &MatcherConfig) -> Self {
        Self::with_threshold(config.threshold)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Comparisons for every listing that matches `item` by name and is
    /// strictly cheaper, largest saving first.
    ///
    /// An item without a positive price is not comparable and yields no
    /// comparisons. Equal savings keep their input order.
    pub fn rank(&self, item: &Item, listings: &[Listing]) -> Vec<Comparison> {
        if !(item.price.is_finite() && item.price > 0.0) {
            debug!(name = %item.name, price = item.price, "Item has no usable price, skipping comparison");
            return Vec::new();
        }

        let mut comparisons: Vec<Comparison> = listings
            .iter()
            .filter(|listing| listing.price.is_finite())
            .filter_map(|listing| {
                let score = fuzzy::score(&item.name, &listing.name);
                if score >= self.threshold {
                    return None;
                }
                let savings = item.price - listing.price;
                if savings <= 0.0 {
                    return None;
                }
                Some(Comparison {
                    item: item.clone(),
                    listing: listing.clone(),
                    score,
                    savings,
                    savings_percentage: 100.0 * savings / item.price,
                })
            })
            .collect();

        comparisons.sort_by(|a, b| b.savings.total_cmp(&a.savings));

        debug!(
            name = %item.name,
            candidates = listings.len(),
            matches = comparisons.len(),
            "Ranked marketplace listings"
        );
        comparisons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attributes;

    fn item(name: &str, price: f64) -> Item {
        Item {
            name: name.to_string(),
            price,
            image_url: None,
            source_host: "www.example.com".to_string(),
            source_url: "https://www.example.com/p".to_string(),
            attributes: Attributes::default(),
        }
    }

    fn listing(id: &str, name: &str, price: f64) -> Listing {
        Listing {
            id: id.to_string(),
            name: name.to_string(),
            price,
            image_url: None,
            listing_url: format!("https://baxus.co/listing/{}", id),
            attributes: Attributes::default(),
        }
    }

    #[test]
    fn test_cheaper_matching_listing_is_kept() {
        let item = item("Laphroaig 10 Year", 55.0);
        let listings = vec![
            listing("a", "Laphroaig 10 Year Old", 42.0),
            listing("b", "Glenfiddich 12", 30.0),
        ];

        let comparisons = Matcher::default().rank(&item, &listings);

        assert_eq!(comparisons.len(), 1);
        let c = &comparisons[0];
        assert_eq!(c.listing.id, "a");
        assert!((c.savings - 13.0).abs() < 1e-9);
        assert!((c.savings_percentage - 23.636).abs() < 0.01);
        assert!(c.score < DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn test_zero_price_item_is_never_compared() {
        let item = item("Laphroaig 10 Year", 0.0);
        let listings = vec![listing("a", "Laphroaig 10 Year", 1.0)];

        assert!(Matcher::default().rank(&item, &listings).is_empty());
    }

    #[test]
    fn test_more_expensive_or_equal_listings_are_dropped() {
        let item = item("Ardbeg 10", 50.0);
        let listings = vec![
            listing("same", "Ardbeg 10", 50.0),
            listing("dearer", "Ardbeg 10 Year Old", 65.0),
            listing("nan", "Ardbeg 10", f64::NAN),
        ];

        assert!(Matcher::default().rank(&item, &listings).is_empty());
    }

    #[test]
    fn test_sorted_by_descending_savings_with_stable_ties() {
        let item = item("Ardbeg 10", 60.0);
        let listings = vec![
            listing("small", "Ardbeg 10", 55.0),
            listing("big", "Ardbeg 10 Year", 30.0),
            listing("tie-1", "Ardbeg 10 Year Old", 45.0),
            listing("tie-2", "ardbeg 10", 45.0),
        ];

        let ids: Vec<String> = Matcher::default()
            .rank(&item, &listings)
            .into_iter()
            .map(|c| c.listing.id)
            .collect();
        assert_eq!(ids, vec!["big", "tie-1", "tie-2", "small"]);
    }

    #[test]
    fn test_accepted_comparisons_hold_savings_invariants() {
        let item = item("Lagavulin 16", 99.0);
        let listings = vec![
            listing("free", "Lagavulin 16", 0.0),
            listing("a", "Lagavulin 16 Year Old", 80.0),
            listing("b", "Talisker 10", 20.0),
        ];

        let comparisons = Matcher::default().rank(&item, &listings);
        assert_eq!(comparisons.len(), 2);
        for c in &comparisons {
            assert!(c.savings > 0.0);
            assert!(c.savings_percentage > 0.0 && c.savings_percentage <= 100.0);
            assert!(c.score < DEFAULT_MATCH_THRESHOLD);
        }
        assert!(comparisons.windows(2).all(|w| w[0].savings >= w[1].savings));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let item = item("Laphroaig 10 Year", 55.0);
        let listings = vec![listing("a", "Laphroaig 10YO Single Malt", 42.0)];

        assert_eq!(Matcher::default().rank(&item, &listings).len(), 1);
        assert!(Matcher::with_threshold(0.05).rank(&item, &listings).is_empty());
    }

    #[test]
    fn test_empty_listings() {
        assert!(Matcher::default().rank(&item("Ardbeg 10", 50.0), &[]).is_empty());
    }
}
