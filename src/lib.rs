//! Honey Barrel: cheaper marketplace listings for the product on a page
//!
//! Pipeline stages:
//! - Extraction of a product from retailer HTML via per-site CSS selector rules
//! - Marketplace search for listings with a similar name
//! - Fuzzy matching and ranking of cheaper listings
//!
//! `Session` ties the stages together for a host; `ffi` exposes the
//! stateless stages to C.

pub mod error;
pub mod extractors;
pub mod ffi;
pub mod fuzzy;
pub mod logging;
pub mod matcher;
pub mod messages;
pub mod model;
pub mod rules;
pub mod search;
pub mod session;
pub mod settings;

pub use error::{Error, Result};
pub use extractors::{first_non_empty, Extractor};
pub use matcher::{Matcher, DEFAULT_MATCH_THRESHOLD};
pub use messages::{Request, Response};
pub use model::{Attributes, Comparison, Item, Listing};
pub use rules::{RuleRegistry, SelectorRuleSet};
pub use search::MarketplaceClient;
pub use session::{MatchOutcome, ResultStore, Session};
pub use settings::Settings;
