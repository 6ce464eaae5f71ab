//! Orchestration of the scrape → search → rank pipeline
//!
//! A `Session` owns the stateless stages plus the one piece of state the
//! host needs across requests: the most recent comparison set.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::extractors::Extractor;
use crate::matcher::Matcher;
use crate::messages::{Request, Response};
use crate::model::{Comparison, Item};
use crate::rules::RuleRegistry;
use crate::search::MarketplaceClient;
use crate::settings::Settings;

/// Shared handle to the last comparison set.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<Vec<Comparison>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Vec<Comparison> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, comparisons: Vec<Comparison>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = comparisons;
    }
}

/// Result of matching one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub comparisons: Vec<Comparison>,
    /// Why the search produced nothing, when it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    extractor: Extractor,
    search: MarketplaceClient,
    matcher: Matcher,
    match_timeout: Option<Duration>,
    results: ResultStore,
}

impl Session {
    pub fn new(settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let rules = match &settings.rules_path {
            Some(path) => RuleRegistry::from_path(path)?,
            None => RuleRegistry::builtin()?,
        };
        let session = Self::with_parts(
            Extractor::new(rules),
            MarketplaceClient::new(settings.search.clone())?,
            Matcher::new(&settings.matcher),
            ResultStore::new(),
        )
        .with_match_timeout(settings.session.match_timeout_ms.map(Duration::from_millis));
        Ok(session)
    }

    pub fn with_parts(
        extractor: Extractor,
        search: MarketplaceClient,
        matcher: Matcher,
        results: ResultStore,
    ) -> Self {
        Self {
            extractor,
            search,
            matcher,
            match_timeout: None,
            results,
        }
    }

    /// Bound how long `match_item` waits for the marketplace.
    pub fn with_match_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.match_timeout = timeout;
        self
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn extract(&self, html: &str, url: &str) -> Option<Item> {
        self.extractor.extract_html(html, url)
    }

    /// Search for `item` and rank the listings; stores the result.
    ///
    /// A failed or timed-out search ranks an empty listing set and reports
    /// the reason in `error`.
    pub async fn match_item(&self, item: &Item) -> MatchOutcome {
        if !(item.price.is_finite() && item.price > 0.0) {
            debug!(name = %item.name, price = item.price, "Item has no usable price, skipping search");
            self.results.replace(Vec::new());
            return MatchOutcome {
                comparisons: Vec::new(),
                error: None,
            };
        }

        let search = self.search.try_search(&item.name);
        let listings = match self.match_timeout {
            Some(limit) => match tokio::time::timeout(limit, search).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(limit)),
            },
            None => search.await,
        };

        let (listings, error) = match listings {
            Ok(listings) => (listings, None),
            Err(e) => {
                warn!(name = %item.name, error = %e, "No listings for item");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let comparisons = self.matcher.rank(item, &listings);
        info!(
            name = %item.name,
            listings = listings.len(),
            matches = comparisons.len(),
            "Matched item against marketplace"
        );
        self.results.replace(comparisons.clone());

        MatchOutcome { comparisons, error }
    }

    /// Extract the item on a page and match it; `None` when no item is found.
    pub async fn compare_page(&self, html: &str, url: &str) -> Option<MatchOutcome> {
        let item = self.extract(html, url)?;
        Some(self.match_item(&item).await)
    }

    pub fn last_results(&self) -> Vec<Comparison> {
        self.results.get()
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::ExtractItem { html, url } => Response::ItemData(self.extract(&html, &url)),
            Request::MatchItem(item) => {
                let outcome = self.match_item(&item).await;
                Response::MatchingResults {
                    comparisons: outcome.comparisons,
                    error: outcome.error,
                }
            }
            Request::GetResults => Response::MatchingResults {
                comparisons: self.last_results(),
                error: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE: &str = r#"
    <html>
    <body>
        <h1 class="product-title">Laphroaig 10 Year</h1>
        <span class="price">$55.00</span>
    </body>
    </html>
    "#;

    const SEARCH_BODY: &str = r#"{"hits": [
        {"_id": "a", "_source": {"title": "Laphroaig 10 Year Old", "price": 42.0}},
        {"_id": "b", "_source": {"title": "Glenfiddich 12", "price": 30.0}}
    ]}"#;

    /// Answer every connection with `body`, optionally after a delay.
    async fn marketplace(body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = stream.read(&mut buf).await;
                    tokio::time::sleep(delay).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        format!("http://{}/api/search/listings", addr)
    }

    fn session(base_url: String) -> Session {
        let mut settings = Settings::default();
        settings.search = SearchConfig {
            base_url,
            ..SearchConfig::default()
        };
        Session::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_compare_page_end_to_end() {
        let session = session(marketplace(SEARCH_BODY, Duration::ZERO).await);

        let outcome = session
            .compare_page(PAGE, "https://shop.example.com/laphroaig-10")
            .await
            .unwrap();

        assert_eq!(outcome.error, None);
        assert_eq!(outcome.comparisons.len(), 1);
        let comparison = &outcome.comparisons[0];
        assert_eq!(comparison.listing.id, "a");
        assert!((comparison.savings - 13.0).abs() < 1e-9);
        assert!((comparison.savings_percentage - 23.6).abs() < 0.05);

        assert_eq!(session.last_results(), outcome.comparisons);
    }

    #[tokio::test]
    async fn test_compare_page_without_item() {
        let session = session(marketplace(SEARCH_BODY, Duration::ZERO).await);

        let outcome = session
            .compare_page("<html><body><p>About us</p></body></html>", "https://shop.example.com/about")
            .await;
        assert_eq!(outcome, None);
    }

    #[tokio::test]
    async fn test_malformed_search_response_matches_nothing() {
        let session = session(marketplace("<!doctype html>", Duration::ZERO).await);
        let item = session.extract(PAGE, "https://shop.example.com/p").unwrap();

        let outcome = session.match_item(&item).await;
        assert!(outcome.comparisons.is_empty());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_slow_search_times_out_and_clears_results() {
        let session = session(marketplace(SEARCH_BODY, Duration::from_secs(5)).await)
            .with_match_timeout(Some(Duration::from_millis(50)));
        let item = session.extract(PAGE, "https://shop.example.com/p").unwrap();

        // seeded through a clone: the session must see the same store
        let store = session.results().clone();
        store.replace(vec![Comparison {
            item: item.clone(),
            listing: crate::model::Listing {
                id: "stale".to_string(),
                name: item.name.clone(),
                price: 1.0,
                image_url: None,
                listing_url: "https://baxus.co/listing/stale".to_string(),
                attributes: Default::default(),
            },
            score: 0.0,
            savings: 54.0,
            savings_percentage: 98.2,
        }]);
        assert_eq!(session.last_results().len(), 1);

        let outcome = session.match_item(&item).await;
        assert!(outcome.comparisons.is_empty());
        assert!(outcome.error.unwrap().contains("timed out"));
        assert!(session.last_results().is_empty());
    }

    #[tokio::test]
    async fn test_unpriced_item_skips_search() {
        // nothing listens here, so a search would report an error
        let session = session("http://127.0.0.1:1/api/search/listings".to_string());
        let mut item = session.extract(PAGE, "https://shop.example.com/p").unwrap();
        item.price = 0.0;

        let priced = session.match_item(&Item { price: 55.0, ..item.clone() }).await;
        assert!(priced.error.is_some());

        let outcome = session.match_item(&item).await;
        assert!(outcome.comparisons.is_empty());
        assert_eq!(outcome.error, None);
        assert!(session.last_results().is_empty());
    }

    #[tokio::test]
    async fn test_handle_message_contract() {
        let session = session(marketplace(SEARCH_BODY, Duration::ZERO).await);

        let response = session
            .handle(Request::ExtractItem {
                html: PAGE.to_string(),
                url: "https://shop.example.com/p".to_string(),
            })
            .await;
        let item = match response {
            Response::ItemData(Some(item)) => item,
            other => panic!("unexpected response {:?}", other),
        };
        assert_eq!(item.price, 55.0);

        let before = session.handle(Request::GetResults).await;
        assert_eq!(
            before,
            Response::MatchingResults {
                comparisons: vec![],
                error: None
            }
        );

        let matched = session.handle(Request::MatchItem(item)).await;
        let after = session.handle(Request::GetResults).await;
        assert_eq!(matched, after);
        match after {
            Response::MatchingResults { comparisons, error } => {
                assert_eq!(comparisons.len(), 1);
                assert_eq!(error, None);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }
}
