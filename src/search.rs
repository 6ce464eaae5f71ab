//! Marketplace listing search
//!
//! One GET per query; the response hits are mapped into `Listing` records.
//! `search` never fails: transport and decoding errors collapse into an
//! empty result, while `try_search` keeps them distinguishable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::extractors::try_parse_price;
use crate::model::{Attributes, Listing};

pub const DEFAULT_SEARCH_URL: &str = "https://services.baxus.co/api/search/listings";
pub const DEFAULT_LISTING_URL_BASE: &str = "https://baxus.co/listing/";
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefix joined with a hit id to form the listing URL
    #[serde(default = "default_listing_url_base")]
    pub listing_url_base: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_listing_url_base() -> String {
    DEFAULT_LISTING_URL_BASE.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_url_base: default_listing_url_base(),
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: None,
        }
    }
}

/// One search hit as sent by the marketplace
#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id", default)]
    id: Option<Value>,
    #[serde(rename = "_source", default)]
    source: HitSource,
}

#[derive(Debug, Default, Deserialize)]
struct HitSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    brand: Option<Value>,
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    country: Option<Value>,
    #[serde(default)]
    region: Option<Value>,
    #[serde(default)]
    abv_percentage: Option<Value>,
}

/// HTTP client for the marketplace search endpoint.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    client: reqwest::Client,
    config: SearchConfig,
}

impl MarketplaceClient {
    /// Build a client. No request timeout is set; callers bound the wait.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(ua) = &config.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search URL for `query`: first page, listed items only.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let size = self.config.page_size.to_string();
        let url = Url::parse_with_params(
            &self.config.base_url,
            &[
                ("from", "0"),
                ("size", size.as_str()),
                ("listed", "true"),
                ("query", query),
            ],
        )?;
        Ok(url)
    }

    /// Listings for `query`; any failure yields an empty list.
    pub async fn search(&self, query: &str) -> Vec<Listing> {
        match self.try_search(query).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!(query = %query, error = %e, "Marketplace search failed");
                Vec::new()
            }
        }
    }

    /// Listings for `query`, reporting why a search failed.
    pub async fn try_search(&self, query: &str) -> Result<Vec<Listing>> {
        let url = self.search_url(query)?;
        debug!(url = %url, "Searching marketplace");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let listings = parse_search_response(
            &body,
            &self.config.listing_url_base,
            self.config.page_size,
        )?;
        debug!(query = %query, count = listings.len(), "Marketplace search complete");
        Ok(listings)
    }
}

/// Map a search response body into at most `limit` listings.
///
/// `hits` may be the array of hits itself or an object wrapping one. Hits
/// without an id, a title or a valid price are skipped.
pub fn parse_search_response(body: &str, listing_url_base: &str, limit: usize) -> Result<Vec<Listing>> {
    let document: Value = serde_json::from_str(body)?;

    let hits = document
        .get("hits")
        .and_then(|hits| {
            hits.as_array()
                .or_else(|| hits.get("hits").and_then(Value::as_array))
        })
        .ok_or_else(|| Error::MalformedResponse("no hits array".to_string()))?;

    let listings: Vec<Listing> = hits
        .iter()
        .filter_map(|hit| listing_from_hit(hit, listing_url_base))
        .take(limit)
        .collect();

    if listings.len() < hits.len().min(limit) {
        debug!(
            hits = hits.len(),
            kept = listings.len(),
            "Skipped incomplete search hits"
        );
    }
    Ok(listings)
}

fn listing_from_hit(raw: &Value, listing_url_base: &str) -> Option<Listing> {
    let hit = Hit::deserialize(raw).ok()?;
    let id = hit.id.as_ref().and_then(value_text)?;
    let source = hit.source;

    let name = source
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;
    let price = source.price.as_ref().and_then(value_price)?;

    let attributes = Attributes {
        brand: source.brand.as_ref().and_then(value_text),
        category: source.kind.as_ref().and_then(value_text),
        vintage: source.year.as_ref().and_then(value_text),
        country: source.country.as_ref().and_then(value_text),
        region: source.region.as_ref().and_then(value_text),
        strength: source.abv_percentage.as_ref().and_then(value_text),
    };

    Some(Listing {
        listing_url: format!("{}{}", listing_url_base, id),
        id,
        name,
        price,
        image_url: source.image_url.filter(|u| !u.trim().is_empty()),
        attributes,
    })
}

/// Strings and numbers as trimmed, non-empty text
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn value_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => try_parse_price(s)?,
        _ => return None,
    };
    if price.is_finite() && price >= 0.0 {
        Some(price)
    } else {
        None
    }
}
