//! Named configuration inputs
//!
//! The resolver never reads the process environment itself. Callers collect
//! the inputs once (usually via [`ConfigInputs::from_env`] at startup) and
//! hand them to [`WebIntegrationConfig::resolve`](crate::WebIntegrationConfig::resolve).

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

pub const SEARXNG_URL: &str = "SEARXNG_URL";
pub const SEARXNG_TIMEOUT: &str = "SEARXNG_TIMEOUT";
pub const CRAWL4AI_URL: &str = "CRAWL4AI_URL";
pub const CRAWL4AI_API_TOKEN: &str = "CRAWL4AI_API_TOKEN";
pub const CRAWL4AI_HEADLESS: &str = "CRAWL4AI_HEADLESS";
pub const CRAWL4AI_VERBOSE: &str = "CRAWL4AI_VERBOSE";
pub const CRAWL4AI_WORD_COUNT_THRESHOLD: &str = "CRAWL4AI_WORD_COUNT_THRESHOLD";
pub const CRAWL4AI_TIMEOUT: &str = "CRAWL4AI_TIMEOUT";
pub const CRAWL4AI_WAIT_TIME: &str = "CRAWL4AI_WAIT_TIME";
pub const CRAWL4AI_WAIT_FOR: &str = "CRAWL4AI_WAIT_FOR";
pub const CRAWL4AI_JS_CODE: &str = "CRAWL4AI_JS_CODE";

/// Every input name the resolver understands
pub const KNOWN_INPUTS: [&str; 11] = [
    SEARXNG_URL,
    SEARXNG_TIMEOUT,
    CRAWL4AI_URL,
    CRAWL4AI_API_TOKEN,
    CRAWL4AI_HEADLESS,
    CRAWL4AI_VERBOSE,
    CRAWL4AI_WORD_COUNT_THRESHOLD,
    CRAWL4AI_TIMEOUT,
    CRAWL4AI_WAIT_TIME,
    CRAWL4AI_WAIT_FOR,
    CRAWL4AI_JS_CODE,
];

/// A set of named string inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInputs {
    values: HashMap<String, String>,
}

impl ConfigInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the known inputs from the process environment
    pub fn from_env() -> Self {
        KNOWN_INPUTS
            .iter()
            .filter_map(|name| env::var(name).ok().map(|value| (*name, value)))
            .collect()
    }

    /// Set (or replace) an input, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up an input; blank values count as absent
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn string(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    pub(crate) fn parse_or<T>(&self, name: &'static str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| ConfigError::malformed(name, raw, e.to_string())),
        }
    }

    pub(crate) fn flag_or(&self, name: &'static str, default: bool) -> ConfigResult<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => parse_flag(raw)
                .ok_or_else(|| ConfigError::malformed(name, raw, "expected true or false")),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigInputs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
