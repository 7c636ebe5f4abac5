//! SearxNG search client

use std::fmt;
use std::str::FromStr;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use web_integration_config::SearchConfig;

use crate::error::{BackendError, BackendErrorKind, BackendResult, ToolError};

const BACKEND: &str = "searxng";
const NO_DESCRIPTION: &str = "No description available";

/// Number of results to return, always within `1..=50`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ResultCount(u8);

impl ResultCount {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 50;
    pub const DEFAULT: ResultCount = ResultCount(3);

    /// `None` when `n` is outside `1..=50`
    pub fn new(n: i64) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&n)
            .then(|| ResultCount(n as u8))
    }

    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for ResultCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// SearxNG `time_range` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Values accepted on input; `none` means no filter
    pub const VARIANTS: &'static [&'static str] = &["day", "week", "month", "year", "none"];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }

    /// Parse an input value, mapping `none` to no filter
    pub fn parse_filter(s: &str) -> Result<Option<Self>, UnknownTimeRange> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range {0:?}")]
pub struct UnknownTimeRange(pub String);

impl FromStr for TimeRange {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(TimeRange::Day),
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "year" => Ok(TimeRange::Year),
            _ => Err(UnknownTimeRange(s.to_string())),
        }
    }
}

/// A validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub count: ResultCount,
    pub time_range: Option<TimeRange>,
    /// 1-based results page
    pub page: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: ResultCount::default(),
            time_range: None,
            page: 1,
        }
    }

    pub fn with_count(mut self, count: ResultCount) -> Self {
        self.count = count;
        self
    }

    pub fn with_time_range(mut self, time_range: Option<TimeRange>) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }
}

/// One normalized search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Hits in backend (relevance) order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    /// How many entries the backend returned before truncation
    pub total_count: usize,
}

/// HTTP client for a SearxNG instance's JSON API
#[derive(Clone)]
pub struct SearxngClient {
    client: Client,
    base_url: String,
}

impl SearxngClient {
    /// Build a client; fails if `SEARXNG_URL` was never configured
    pub fn from_config(config: &SearchConfig) -> Result<Self, ToolError> {
        let base_url = config.base_url()?.to_string();
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::from_transport(BACKEND, e))?;

        Ok(Self { client, base_url })
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one search; a single attempt, no retries
    pub async fn search(&self, query: &SearchQuery) -> BackendResult<SearchResults> {
        debug!(
            query = %query.query,
            count = query.count.get(),
            time_range = ?query.time_range,
            page = query.page,
            "Searching SearxNG"
        );

        let url = format!("{}/search", self.base_url);
        let page = query.page.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", query.query.as_str()),
            ("format", "json"),
            ("pageno", page.as_str()),
        ];
        if let Some(range) = query.time_range {
            params.push(("time_range", range.as_str()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(BACKEND, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::from_transport(BACKEND, e))?;

        if !status.is_success() {
            let error = BackendError::from_status(BACKEND, status, &body);
            warn!("SearxNG search failed: {}", error);
            return Err(error);
        }

        let parsed: SearxngResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse SearxNG response: {}", e);
            BackendError::new(
                BACKEND,
                BackendErrorKind::InvalidResponse,
                format!("Invalid JSON response: {e}"),
            )
        })?;

        let total_count = parsed.results.len();
        let results: Vec<SearchHit> = parsed
            .results
            .into_iter()
            .filter_map(SearxngResult::from_entry)
            .take(query.count.get())
            .collect();

        debug!(
            total_count,
            returned = results.len(),
            "SearxNG search completed"
        );

        Ok(SearchResults {
            results,
            total_count,
        })
    }
}

/// `SearxNG` JSON response structure
///
/// Entries stay untyped here so one bad entry cannot fail the whole response.
#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

impl SearxngResult {
    fn from_entry(entry: Value) -> Option<SearchHit> {
        match serde_json::from_value::<SearxngResult>(entry) {
            Ok(result) => result.normalize(),
            Err(e) => {
                warn!("Skipping malformed SearxNG result: {}", e);
                None
            }
        }
    }

    fn normalize(self) -> Option<SearchHit> {
        match (self.title, self.url) {
            (Some(title), Some(url)) => Some(SearchHit {
                title,
                url,
                description: self
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            }),
            (title, url) => {
                warn!(?title, ?url, "Skipping malformed SearxNG result");
                None
            }
        }
    }
}
