//! Records passed between the pipeline stages.

use serde::{Deserialize, Serialize};

/// Optional descriptive attributes shared by items and listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Vintage or age statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vintage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Alcohol strength, as printed by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
}

/// Names of the optional attribute fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Brand,
    Category,
    Vintage,
    Country,
    Region,
    Strength,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 6] = [
        AttributeKind::Brand,
        AttributeKind::Category,
        AttributeKind::Vintage,
        AttributeKind::Country,
        AttributeKind::Region,
        AttributeKind::Strength,
    ];
}

impl Attributes {
    /// True when no attribute is present.
    pub fn is_empty(&self) -> bool {
        AttributeKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&str> {
        let slot = match kind {
            AttributeKind::Brand => &self.brand,
            AttributeKind::Category => &self.category,
            AttributeKind::Vintage => &self.vintage,
            AttributeKind::Country => &self.country,
            AttributeKind::Region => &self.region,
            AttributeKind::Strength => &self.strength,
        };
        slot.as_deref()
    }

    /// Set an attribute; blank values clear it.
    pub fn set(&mut self, kind: AttributeKind, value: Option<String>) {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let slot = match kind {
            AttributeKind::Brand => &mut self.brand,
            AttributeKind::Category => &mut self.category,
            AttributeKind::Vintage => &mut self.vintage,
            AttributeKind::Country => &mut self.country,
            AttributeKind::Region => &mut self.region,
            AttributeKind::Strength => &mut self.strength,
        };
        *slot = value;
    }
}

/// The product detected on a retailer page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    /// 0 when the page carried no parseable price
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub source_host: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

/// A marketplace search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub listing_url: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

/// An item paired with a cheaper, similarly named listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub item: Item,
    pub listing: Listing,
    /// Fuzzy name score of the pair, 0.0 = identical
    pub score: f64,
    pub savings: f64,
    pub savings_percentage: f64,
}
