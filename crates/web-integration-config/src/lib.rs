//! # Web Integration Configuration
//!
//! Immutable configuration for the `search` (SearxNG) and `crawl` (Crawl4AI)
//! MCP tools, resolved once per process from named inputs.
//!
//! Optional settings fall back to documented defaults during resolution.
//! Settings a tool cannot work without (`SEARXNG_URL` for search,
//! `CRAWL4AI_API_TOKEN` for crawl) are checked lazily, when that tool is first
//! used, so a deployment can run with only one backend configured.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use web_integration_config::{ConfigInputs, WebIntegrationConfig};
//!
//! let config = WebIntegrationConfig::resolve(&ConfigInputs::from_env())?;
//! let searx = config.search.base_url()?;
//! # Ok::<(), web_integration_config::ConfigError>(())
//! ```

#![warn(clippy::all)]

mod components;
mod error;
pub mod inputs;

pub use components::*;
pub use error::{ConfigError, ConfigErrorKind, ConfigResult};
pub use inputs::ConfigInputs;

use tracing::debug;

/// Resolved configuration shared by every backend client
#[derive(Debug, Clone, Default)]
pub struct WebIntegrationConfig {
    pub search: SearchConfig,
    pub crawl: CrawlConfig,
}

impl WebIntegrationConfig {
    /// Build the configuration from named inputs, applying defaults
    ///
    /// Fails only on inputs that are present but malformed. Missing required
    /// fields are reported by the per-tool accessors instead.
    pub fn resolve(inputs: &ConfigInputs) -> ConfigResult<Self> {
        let config = Self {
            search: SearchConfig::from_inputs(inputs)?,
            crawl: CrawlConfig::from_inputs(inputs)?,
        };

        debug!(
            search_configured = config.search.is_configured(),
            crawl_url = %config.crawl.base_url,
            crawl_token = config.crawl.has_api_token(),
            js_snippets = config.crawl.js_code.len(),
            "Resolved web integration configuration"
        );

        Ok(config)
    }

    /// Shorthand for `resolve(&ConfigInputs::from_env())`
    pub fn from_env() -> ConfigResult<Self> {
        Self::resolve(&ConfigInputs::from_env())
    }
}
