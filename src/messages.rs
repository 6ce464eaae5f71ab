//! Request/response payloads exchanged with the host
//!
//! Serialized as `{"type": "...", "data": ...}` so the host can route them
//! over whatever channel it has. The transport itself lives outside this
//! crate.

use serde::{Deserialize, Serialize};

use crate::model::{Comparison, Item};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Extract the product from a loaded page
    ExtractItem { html: String, url: String },
    /// Search the marketplace and rank listings for an item
    MatchItem(Item),
    /// Most recent match result
    GetResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// Extraction result; `null` when no item was detected
    ItemData(Option<Item>),
    MatchingResults {
        comparisons: Vec<Comparison>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}
