//! SearxNG search configuration

use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::inputs::{ConfigInputs, SEARXNG_TIMEOUT, SEARXNG_URL};

/// Default request timeout for search calls, in seconds
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

/// Settings for the `search` tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
        }
    }
}

impl SearchConfig {
    /// Configuration pointing at a known SearxNG instance
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(normalize_url(base_url.into())),
            ..Self::default()
        }
    }

    pub(crate) fn from_inputs(inputs: &ConfigInputs) -> ConfigResult<Self> {
        let timeout_secs = inputs.parse_or(SEARXNG_TIMEOUT, DEFAULT_SEARCH_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::malformed(
                SEARXNG_TIMEOUT,
                "0",
                "timeout must be greater than 0",
            ));
        }

        Ok(Self {
            base_url: inputs
                .get(SEARXNG_URL)
                .map(|raw| parse_base_url(SEARXNG_URL, raw))
                .transpose()?,
            timeout_secs,
        })
    }

    /// SearxNG base URL, required once the search tool is used
    pub fn base_url(&self) -> ConfigResult<&str> {
        self.base_url
            .as_deref()
            .ok_or(ConfigError::MissingRequired { field: SEARXNG_URL })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub(crate) fn normalize_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Accept an absolute `http`/`https` URL with a host, trailing slash trimmed
pub(crate) fn parse_base_url(field: &'static str, raw: &str) -> ConfigResult<String> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::malformed(field, raw, format!("not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::malformed(
            field,
            raw,
            format!("unsupported scheme {:?}, expected http or https", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::malformed(field, raw, "URL has no host"));
    }

    Ok(normalize_url(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_reported_on_access() {
        let config = SearchConfig::from_inputs(&ConfigInputs::new()).unwrap();
        assert!(!config.is_configured());
        assert_eq!(
            config.base_url(),
            Err(ConfigError::MissingRequired { field: SEARXNG_URL })
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = SearchConfig::with_base_url("http://searx.local:8080/");
        assert_eq!(config.base_url().unwrap(), "http://searx.local:8080");
    }

    #[test]
    fn scheme_less_url_is_malformed() {
        for raw in ["searx.local:8080", "localhost:8888", "ftp://searx.local", "not a url"] {
            let inputs = ConfigInputs::new().with(SEARXNG_URL, raw);
            let err = SearchConfig::from_inputs(&inputs).unwrap_err();
            assert!(
                matches!(err, ConfigError::MalformedValue { field: SEARXNG_URL, .. }),
                "{raw} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn https_url_with_path_is_accepted() {
        let inputs = ConfigInputs::new().with(SEARXNG_URL, "https://search.example.org/searx/");
        let config = SearchConfig::from_inputs(&inputs).unwrap();
        assert_eq!(config.base_url().unwrap(), "https://search.example.org/searx");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let inputs = ConfigInputs::new().with(SEARXNG_TIMEOUT, "0");
        assert!(SearchConfig::from_inputs(&inputs).is_err());
    }
}
