//! Settings loaded from an optional file and `HONEY_BARREL_*` environment
//! variables (`HONEY_BARREL_MATCHER__THRESHOLD=0.3`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matcher::MatcherConfig;
use crate::search::SearchConfig;

pub const ENV_PREFIX: &str = "HONEY_BARREL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// JSON rule table replacing the built-in one
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a match request waits for search results
    #[serde(default)]
    pub match_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "honey_barrel=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Settings {
    /// Load settings: defaults, then `path` (if any), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("search.base_url must not be empty".to_string()));
        }
        if self.search.listing_url_base.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "search.listing_url_base must not be empty".to_string(),
            ));
        }
        if self.search.page_size == 0 {
            return Err(Error::InvalidConfig(
                "search.page_size must be greater than 0".to_string(),
            ));
        }
        let threshold = self.matcher.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "matcher.threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.session.match_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "session.match_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
