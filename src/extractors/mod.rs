//! Product extraction from retailer pages
//!
//! The page host picks a selector rule set; every field is then read with
//! the first of its candidate selectors that yields a non-empty value.

mod css_extractor;
mod price;

pub use css_extractor::*;
pub use price::*;

use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;
use crate::model::{Attributes, Item};
use crate::rules::RuleRegistry;

/// Evaluate candidates in order and return the first non-blank value.
pub fn first_non_empty<T, F>(candidates: &[T], mut evaluate: F) -> Option<String>
where
    F: FnMut(&T) -> Option<String>,
{
    candidates
        .iter()
        .filter_map(|candidate| evaluate(candidate))
        .find(|value| !value.trim().is_empty())
}

/// Scrapes an `Item` from a loaded page.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: RuleRegistry,
}

impl Extractor {
    pub fn new(rules: RuleRegistry) -> Self {
        Self { rules }
    }

    /// Extractor over the rule table embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(RuleRegistry::builtin()?))
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Parse `html` and extract from it.
    pub fn extract_html(&self, html: &str, page_url: &str) -> Option<Item> {
        let document = Html::parse_document(html);
        self.extract(&document, page_url)
    }

    /// Extract the product shown on `document`.
    ///
    /// Returns `None` when no name can be found (or the page URL is not a
    /// URL); every other field is optional.
    pub fn extract(&self, document: &Html, page_url: &str) -> Option<Item> {
        let url = match Url::parse(page_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %page_url, error = %e, "Cannot extract from an invalid page URL");
                return None;
            }
        };
        let host = url.host_str().unwrap_or_default().to_lowercase();
        let rule_set = self.rules.select(&host);
        debug!(host = %host, rule_set = %rule_set.key, "Selected selector rule set");

        let Some(name) = first_non_empty(&rule_set.name, |s| select_text(document, s)) else {
            debug!(host = %host, rule_set = %rule_set.key, "No item name found on page");
            return None;
        };

        let price = first_non_empty(&rule_set.price, |s| select_text(document, s))
            .map(|text| parse_price(&text))
            .unwrap_or(0.0);

        let image_url = first_non_empty(&rule_set.image, |s| select_image_url(document, s, &url));

        let mut attributes = Attributes::default();
        for (kind, selectors) in &rule_set.attributes {
            attributes.set(*kind, first_non_empty(selectors, |s| select_text(document, s)));
        }

        debug!(name = %name, price, "Extracted item");
        Some(Item {
            name,
            price,
            image_url,
            source_host: host,
            source_url: page_url.to_string(),
            attributes,
        })
    }
}
