//! Crawl4AI crawl configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use super::search::{normalize_url, parse_base_url};
use crate::error::{ConfigError, ConfigResult};
use crate::inputs::{
    ConfigInputs, CRAWL4AI_API_TOKEN, CRAWL4AI_HEADLESS, CRAWL4AI_JS_CODE, CRAWL4AI_TIMEOUT,
    CRAWL4AI_URL, CRAWL4AI_VERBOSE, CRAWL4AI_WAIT_FOR, CRAWL4AI_WAIT_TIME,
    CRAWL4AI_WORD_COUNT_THRESHOLD,
};

pub const DEFAULT_CRAWL4AI_URL: &str = "http://localhost:11235";
pub const DEFAULT_CRAWL_TIMEOUT_SECS: u64 = 300;

/// Settings for the `crawl` tool
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Crawl4AI base URL, without trailing slash
    pub base_url: String,
    api_token: Option<SecretString>,
    /// Run the browser without a window
    pub headless: bool,
    /// Ask Crawl4AI for verbose crawler logs
    pub verbose: bool,
    /// Minimum words per content block kept by the extractor
    pub word_count_threshold: u32,
    /// Upper bound for a single crawl call, in seconds
    pub timeout_secs: u64,
    /// Extra wait after page load, in seconds; 0 disables it
    pub wait_time_secs: u64,
    /// CSS selector to wait for before extraction
    pub wait_for: Option<String>,
    /// Scripts executed after page load, in order
    pub js_code: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CRAWL4AI_URL.to_string(),
            api_token: None,
            headless: true,
            verbose: false,
            word_count_threshold: 0,
            timeout_secs: DEFAULT_CRAWL_TIMEOUT_SECS,
            wait_time_secs: 0,
            wait_for: None,
            js_code: Vec::new(),
        }
    }
}

impl CrawlConfig {
    pub(crate) fn from_inputs(inputs: &ConfigInputs) -> ConfigResult<Self> {
        let defaults = Self::default();

        let timeout_secs = inputs.parse_or(CRAWL4AI_TIMEOUT, defaults.timeout_secs)?;
        if timeout_secs == 0 {
            return Err(ConfigError::malformed(
                CRAWL4AI_TIMEOUT,
                "0",
                "timeout must be greater than 0",
            ));
        }

        let js_code = match inputs.get(CRAWL4AI_JS_CODE) {
            Some(raw) => parse_js_code(raw)?,
            None => defaults.js_code,
        };

        Ok(Self {
            base_url: match inputs.get(CRAWL4AI_URL) {
                Some(raw) => parse_base_url(CRAWL4AI_URL, raw)?,
                None => defaults.base_url,
            },
            api_token: inputs.string(CRAWL4AI_API_TOKEN).map(SecretString::from),
            headless: inputs.flag_or(CRAWL4AI_HEADLESS, defaults.headless)?,
            verbose: inputs.flag_or(CRAWL4AI_VERBOSE, defaults.verbose)?,
            word_count_threshold: inputs
                .parse_or(CRAWL4AI_WORD_COUNT_THRESHOLD, defaults.word_count_threshold)?,
            timeout_secs,
            wait_time_secs: inputs.parse_or(CRAWL4AI_WAIT_TIME, defaults.wait_time_secs)?,
            wait_for: inputs.string(CRAWL4AI_WAIT_FOR),
            js_code,
        })
    }

    /// Builder-style override of the API token
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Builder-style override of the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_url(base_url.into());
        self
    }

    /// API token, required once the crawl tool is used
    pub fn api_token(&self) -> ConfigResult<&str> {
        self.api_token
            .as_ref()
            .map(|token| token.expose_secret())
            .ok_or(ConfigError::MissingRequired {
                field: CRAWL4AI_API_TOKEN,
            })
    }

    pub fn has_api_token(&self) -> bool {
        self.api_token.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Decode `CRAWL4AI_JS_CODE`, a JSON array of script strings
fn parse_js_code(raw: &str) -> ConfigResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
        ConfigError::malformed(
            CRAWL4AI_JS_CODE,
            raw,
            format!("expected a JSON array of strings: {e}"),
        )
    })
}
