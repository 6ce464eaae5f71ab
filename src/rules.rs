//! Per-retailer selector rule sets
//!
//! Rule sets are tested top-to-bottom against the page host; the final
//! entry carries the `*` pattern and catches every host.

use std::path::Path;

use scraper::Selector;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::AttributeKind;

/// Rule table shipped with the crate.
const BUILTIN_RULES: &str = include_str!("../rules/retailers.json");

const WILDCARD: &str = "*";

/// One entry of the rule table as written in JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetConfig {
    pub key: String,
    pub host_patterns: Vec<String>,
    pub selectors: FieldSelectors,
}

/// Candidate selectors per field, in priority order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSelectors {
    pub name: Vec<String>,
    #[serde(default)]
    pub price: Vec<String>,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub attributes: AttributeSelectors,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributeSelectors {
    #[serde(default)]
    pub brand: Vec<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub vintage: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    #[serde(default)]
    pub region: Vec<String>,
    #[serde(default)]
    pub strength: Vec<String>,
}

impl AttributeSelectors {
    fn for_kind(&self, kind: AttributeKind) -> &[String] {
        match kind {
            AttributeKind::Brand => &self.brand,
            AttributeKind::Category => &self.category,
            AttributeKind::Vintage => &self.vintage,
            AttributeKind::Country => &self.country,
            AttributeKind::Region => &self.region,
            AttributeKind::Strength => &self.strength,
        }
    }
}

/// Host predicate of a rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    Any,
    /// Matches the domain itself and any subdomain of it
    Domain(String),
}

impl HostPattern {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == WILDCARD {
            return Some(HostPattern::Any);
        }
        let domain = raw.trim_start_matches("www.").to_lowercase();
        if domain.is_empty() {
            None
        } else {
            Some(HostPattern::Domain(domain))
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Any => true,
            HostPattern::Domain(domain) => {
                host == domain.as_str()
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

/// A compiled, immutable rule set.
#[derive(Debug, Clone)]
pub struct SelectorRuleSet {
    pub key: String,
    pub host_patterns: Vec<HostPattern>,
    pub name: Vec<Selector>,
    pub price: Vec<Selector>,
    pub image: Vec<Selector>,
    pub attributes: Vec<(AttributeKind, Vec<Selector>)>,
}

impl SelectorRuleSet {
    fn compile(config: &RuleSetConfig) -> Result<Self> {
        let host_patterns: Vec<HostPattern> = config
            .host_patterns
            .iter()
            .filter_map(|p| HostPattern::parse(p))
            .collect();
        if host_patterns.is_empty() {
            return Err(Error::InvalidRules(format!(
                "rule set '{}' has no host patterns",
                config.key
            )));
        }

        let selectors = &config.selectors;
        let name = compile_selectors(&config.key, &selectors.name);
        if name.is_empty() {
            return Err(Error::InvalidRules(format!(
                "rule set '{}' has no usable name selector",
                config.key
            )));
        }

        let attributes = AttributeKind::ALL
            .iter()
            .map(|kind| {
                (
                    *kind,
                    compile_selectors(&config.key, selectors.attributes.for_kind(*kind)),
                )
            })
            .filter(|(_, compiled)| !compiled.is_empty())
            .collect();

        Ok(Self {
            key: config.key.clone(),
            host_patterns,
            name,
            price: compile_selectors(&config.key, &selectors.price),
            image: compile_selectors(&config.key, &selectors.image),
            attributes,
        })
    }

    pub fn matches_host(&self, host: &str) -> bool {
        self.host_patterns.iter().any(|p| p.matches(host))
    }

    fn is_fallback(&self) -> bool {
        self.host_patterns.contains(&HostPattern::Any)
    }
}

/// Compile selectors, dropping the ones scraper cannot parse
fn compile_selectors(key: &str, raw: &[String]) -> Vec<Selector> {
    raw.iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(rule_set = %key, selector = %s, error = ?e, "Dropping unparseable selector");
                None
            }
        })
        .collect()
}

/// Ordered rule sets, ending with the universal fallback.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rule_sets: Vec<SelectorRuleSet>,
}

impl RuleRegistry {
    /// Load the rule table embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let configs: Vec<RuleSetConfig> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidRules(format!("rule table is not valid JSON: {}", e)))?;
        Self::from_configs(&configs)
    }

    /// Compile and validate a rule table.
    ///
    /// The `*` pattern must appear exactly once, in the last entry.
    pub fn from_configs(configs: &[RuleSetConfig]) -> Result<Self> {
        let rule_sets = configs
            .iter()
            .map(SelectorRuleSet::compile)
            .collect::<Result<Vec<_>>>()?;

        let fallbacks: Vec<usize> = rule_sets
            .iter()
            .enumerate()
            .filter(|(_, rs)| rs.is_fallback())
            .map(|(i, _)| i)
            .collect();

        match fallbacks.as_slice() {
            [i] if *i + 1 == rule_sets.len() => {}
            [] => {
                return Err(Error::InvalidRules(
                    "no fallback rule set with the '*' pattern".to_string(),
                ))
            }
            [_] => {
                return Err(Error::InvalidRules(
                    "the '*' fallback rule set must be declared last".to_string(),
                ))
            }
            _ => {
                return Err(Error::InvalidRules(
                    "the '*' pattern may only appear once".to_string(),
                ))
            }
        }

        debug!(count = rule_sets.len(), "Loaded selector rule sets");
        Ok(Self { rule_sets })
    }

    /// First rule set whose patterns match `host`.
    pub fn select(&self, host: &str) -> &SelectorRuleSet {
        let host = host.trim_end_matches('.').to_lowercase();
        self.rule_sets
            .iter()
            .find(|rs| rs.matches_host(&host))
            .unwrap_or_else(|| self.fallback())
    }

    pub fn fallback(&self) -> &SelectorRuleSet {
        // from_configs guarantees a non-empty table ending with the fallback
        &self.rule_sets[self.rule_sets.len() - 1]
    }

    pub fn rule_sets(&self) -> &[SelectorRuleSet] {
        &self.rule_sets
    }
}
