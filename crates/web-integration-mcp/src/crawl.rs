//! Crawl4AI client
//!
//! Talks to the `/crawl_direct` endpoint, which crawls synchronously and
//! answers with the extracted markdown and link lists in one response.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use web_integration_config::CrawlConfig;

use crate::error::{BackendError, BackendErrorKind, BackendResult, ToolError};

const BACKEND: &str = "crawl4ai";
const CRAWL_PRIORITY: u8 = 5;

/// Crawl4AI cache behaviour for a single crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Bypass,
    #[default]
    Enabled,
    Disabled,
    ReadOnly,
    WriteOnly,
}

impl CacheMode {
    pub const VARIANTS: &'static [&'static str] =
        &["bypass", "enabled", "disabled", "read_only", "write_only"];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheMode::Bypass => "bypass",
            CacheMode::Enabled => "enabled",
            CacheMode::Disabled => "disabled",
            CacheMode::ReadOnly => "read_only",
            CacheMode::WriteOnly => "write_only",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cache mode {0:?}")]
pub struct UnknownCacheMode(pub String);

impl FromStr for CacheMode {
    type Err = UnknownCacheMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bypass" => Ok(CacheMode::Bypass),
            "enabled" => Ok(CacheMode::Enabled),
            "disabled" => Ok(CacheMode::Disabled),
            "read_only" => Ok(CacheMode::ReadOnly),
            "write_only" => Ok(CacheMode::WriteOnly),
            _ => Err(UnknownCacheMode(s.to_string())),
        }
    }
}

/// Browser and extraction settings sent with every crawl
///
/// Starts from the process configuration; each field can be overridden for a
/// single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub headless: bool,
    pub verbose: bool,
    pub word_count_threshold: u32,
    pub wait_time_secs: u64,
    pub wait_for: Option<String>,
    pub js_code: Vec<String>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

impl From<&CrawlConfig> for CrawlOptions {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            headless: config.headless,
            verbose: config.verbose,
            word_count_threshold: config.word_count_threshold,
            wait_time_secs: config.wait_time_secs,
            wait_for: config.wait_for.clone(),
            js_code: config.js_code.clone(),
        }
    }
}

impl CrawlOptions {
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_word_count_threshold(mut self, threshold: u32) -> Self {
        self.word_count_threshold = threshold;
        self
    }

    pub fn with_wait_time_secs(mut self, secs: u64) -> Self {
        self.wait_time_secs = secs;
        self
    }

    pub fn with_wait_for(mut self, selector: impl Into<String>) -> Self {
        self.wait_for = Some(selector.into());
        self
    }

    pub fn with_js_code(mut self, js_code: Vec<String>) -> Self {
        self.js_code = js_code;
        self
    }
}

/// One page to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub url: String,
    /// Extra HTTP headers the crawler sends to the target site
    pub headers: BTreeMap<String, String>,
    pub cache_mode: CacheMode,
    /// Overrides the configured crawl timeout for this request
    pub timeout: Option<Duration>,
    pub options: CrawlOptions,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>, options: CrawlOptions) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            cache_mode: CacheMode::default(),
            timeout: None,
            options,
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Normalized outcome of a crawl the backend accepted
///
/// `success: false` means Crawl4AI answered but could not crawl the page;
/// `error` then carries its explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlResult {
    pub url: String,
    pub content: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub internal_links: Vec<Link>,
    pub external_links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// HTTP client for the Crawl4AI REST API
#[derive(Clone)]
pub struct Crawl4AiClient {
    client: Client,
    base_url: String,
    api_token: SecretString,
    default_timeout: Duration,
}

impl fmt::Debug for Crawl4AiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawl4AiClient")
            .field("base_url", &self.base_url)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

impl Crawl4AiClient {
    /// Build a client; fails if `CRAWL4AI_API_TOKEN` was never configured
    pub fn from_config(config: &CrawlConfig) -> Result<Self, ToolError> {
        let api_token = config.api_token()?;
        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::from_transport(BACKEND, e))?;

        Ok(Self::with_client(client, &config.base_url, api_token)
            .with_default_timeout(config.timeout()))
    }

    pub fn with_client(client: Client, base_url: &str, api_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: SecretString::from(api_token.to_string()),
            default_timeout: CrawlConfig::default().timeout(),
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Crawl one URL; a single attempt bounded by the request or default timeout
    pub async fn crawl(&self, request: &CrawlRequest) -> BackendResult<CrawlResult> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let payload = CrawlPayload::new(request, timeout);

        debug!(
            url = %request.url,
            cache_mode = %request.cache_mode,
            timeout_secs = timeout.as_secs_f64(),
            js_snippets = request.options.js_code.len(),
            "Crawling with Crawl4AI"
        );

        let response = self
            .client
            .post(format!("{}/crawl_direct", self.base_url))
            .bearer_auth(self.api_token.expose_secret())
            .timeout(timeout)
            .json(&payload)
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
            warn!("Crawl4AI request failed: {}", error);
            return Err(error);
        }

        let parsed: CrawlResponseBody = serde_json::from_str(&body).map_err(|e| {
            BackendError::new(
                BACKEND,
                BackendErrorKind::InvalidResponse,
                format!("Invalid JSON response: {e}"),
            )
        })?;

        let result = parsed.into_result(&request.url)?;
        if !result.success {
            warn!(url = %request.url, error = ?result.error, "Crawl4AI reported a failed crawl");
        }
        Ok(result)
    }
}

#[derive(Debug, Serialize)]
struct CrawlerParams {
    headless: bool,
    verbose: bool,
    word_count_threshold: u32,
}

/// Request body for `/crawl_direct`
#[derive(Debug, Serialize)]
struct CrawlPayload<'a> {
    urls: &'a str,
    priority: u8,
    cache_mode: CacheMode,
    crawler_params: CrawlerParams,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    js_code: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<&'a BTreeMap<String, String>>,
}

impl<'a> CrawlPayload<'a> {
    fn new(request: &'a CrawlRequest, timeout: Duration) -> Self {
        let options = &request.options;
        Self {
            urls: &request.url,
            priority: CRAWL_PRIORITY,
            cache_mode: request.cache_mode,
            crawler_params: CrawlerParams {
                headless: options.headless,
                verbose: options.verbose,
                word_count_threshold: options.word_count_threshold,
            },
            timeout: timeout.as_secs().max(1),
            wait_for: options.wait_for.as_deref(),
            wait_time: (options.wait_time_secs > 0).then_some(options.wait_time_secs),
            js_code: (!options.js_code.is_empty()).then_some(options.js_code.as_slice()),
            headers: (!request.headers.is_empty()).then_some(&request.headers),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CrawlResponseBody {
    result: Option<CrawlResponseResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrawlResponseResult {
    #[serde(default)]
    markdown: Option<Markdown>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    links: ResponseLinks,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Older servers send plain markdown, newer ones an object of variants
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Markdown {
    Plain(String),
    Structured { raw_markdown: String },
}

/// Link entries stay untyped so one bad entry is skipped rather than fatal
#[derive(Debug, Default, Deserialize)]
struct ResponseLinks {
    #[serde(default)]
    internal: Vec<Value>,
    #[serde(default)]
    external: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseLink {
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl From<ResponseLink> for Link {
    fn from(link: ResponseLink) -> Self {
        Link {
            href: link.href.unwrap_or_default(),
            text: link.text.unwrap_or_default(),
            title: link.title.filter(|t| !t.is_empty()),
        }
    }
}

fn parse_links(entries: Vec<Value>) -> Vec<Link> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ResponseLink>(entry) {
            Ok(link) => Some(Link::from(link)),
            Err(e) => {
                warn!("Skipping malformed Crawl4AI link: {}", e);
                None
            }
        })
        .collect()
}

impl CrawlResponseBody {
    fn into_result(self, url: &str) -> BackendResult<CrawlResult> {
        let result = self.result.ok_or_else(|| {
            BackendError::new(
                BACKEND,
                BackendErrorKind::InvalidResponse,
                "response has no `result` object",
            )
        })?;

        let content = match result.markdown {
            Some(Markdown::Plain(text)) => text,
            Some(Markdown::Structured { raw_markdown }) => raw_markdown,
            None => String::new(),
        };

        Ok(CrawlResult {
            url: url.to_string(),
            content,
            success: result.success,
            error: self.error.or(result.error_message).filter(|e| !e.is_empty()),
            internal_links: parse_links(result.links.internal),
            external_links: parse_links(result.links.external),
            metadata: result.metadata.filter(|m| !m.is_null()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Crawl4AiClient {
        Crawl4AiClient::with_client(Client::new(), &server.uri(), "test-token")
    }

    fn success_body() -> Value {
        json!({
            "result": {
                "markdown": "# Example\n\nHello",
                "success": true,
                "links": {
                    "internal": [{"href": "https://example.com/a", "text": "A", "title": "Page A"}],
                    "external": [{"href": "https://other.org", "text": "Other"}]
                },
                "metadata": {"title": "Example"}
            }
        })
    }

    #[test]
    fn cache_mode_parses_case_insensitively() {
        assert_eq!("READ_ONLY".parse::<CacheMode>(), Ok(CacheMode::ReadOnly));
        assert_eq!(CacheMode::default(), CacheMode::Enabled);
        assert!("sometimes".parse::<CacheMode>().is_err());
    }

    #[test]
    fn payload_omits_unset_optionals() {
        let request = CrawlRequest::new("https://example.com", CrawlOptions::default());
        let payload = serde_json::to_value(CrawlPayload::new(&request, Duration::from_secs(300)))
            .unwrap();

        assert_eq!(
            payload,
            json!({
                "urls": "https://example.com",
                "priority": 5,
                "cache_mode": "enabled",
                "crawler_params": {"headless": true, "verbose": false, "word_count_threshold": 0},
                "timeout": 300
            })
        );
    }

    #[test]
    fn payload_carries_overrides_in_order() {
        let options = CrawlOptions::default()
            .with_wait_for("#content")
            .with_wait_time_secs(3)
            .with_js_code(vec!["a();".into(), "b();".into()]);
        let request = CrawlRequest::new("https://example.com", options)
            .with_cache_mode(CacheMode::Bypass)
            .with_headers(BTreeMap::from([("Accept-Language".into(), "en".into())]));

        let payload = serde_json::to_value(CrawlPayload::new(&request, Duration::from_secs(30)))
            .unwrap();

        assert_eq!(payload["cache_mode"], "bypass");
        assert_eq!(payload["wait_for"], "#content");
        assert_eq!(payload["wait_time"], 3);
        assert_eq!(payload["js_code"], json!(["a();", "b();"]));
        assert_eq!(payload["headers"], json!({"Accept-Language": "en"}));
        assert_eq!(payload["timeout"], 30);
    }

    #[test]
    fn debug_hides_token() {
        let client = Crawl4AiClient::with_client(Client::new(), "http://crawl", "super-secret");
        assert!(!format!("{client:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn test_crawl_sends_bearer_token_and_parses_result() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_partial_json(json!({"urls": "https://example.com", "priority": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let request = CrawlRequest::new("https://example.com", CrawlOptions::default());
        let result = client(&mock_server).crawl(&request).await.unwrap();

        assert!(result.success);
        assert_eq!(result.content, "# Example\n\nHello");
        assert_eq!(result.internal_links[0].title.as_deref(), Some("Page A"));
        assert_eq!(result.external_links[0].title, None);
        assert_eq!(result.metadata, Some(json!({"title": "Example"})));
    }

    #[tokio::test]
    async fn test_crawl_reports_backend_side_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"markdown": "", "success": false, "links": {}},
                "error": "net::ERR_NAME_NOT_RESOLVED"
            })))
            .mount(&mock_server)
            .await;

        let request = CrawlRequest::new("https://nope.invalid", CrawlOptions::default());
        let result = client(&mock_server).crawl(&request).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("net::ERR_NAME_NOT_RESOLVED"));
        assert!(result.internal_links.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_skips_badly_typed_links() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "markdown": "body",
                    "success": true,
                    "links": {
                        "internal": [
                            {"href": "https://example.com/a", "text": "A"},
                            {"href": 7, "text": "numeric href"},
                            null,
                            {"href": "https://example.com/b", "text": "B"}
                        ],
                        "external": ["not an object"]
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let request = CrawlRequest::new("https://example.com", CrawlOptions::default());
        let result = client(&mock_server).crawl(&request).await.unwrap();

        let hrefs: Vec<&str> = result.internal_links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["https://example.com/a", "https://example.com/b"]);
        assert!(result.external_links.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_accepts_structured_markdown() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "markdown": {"raw_markdown": "raw text", "fit_markdown": "fit"},
                    "success": true
                }
            })))
            .mount(&mock_server)
            .await;

        let request = CrawlRequest::new("https://example.com", CrawlOptions::default());
        let result = client(&mock_server).crawl(&request).await.unwrap();

        assert_eq!(result.content, "raw text");
    }

    #[tokio::test]
    async fn test_crawl_distinguishes_auth_from_server_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .and(header("Authorization", "Bearer wrong"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let request = CrawlRequest::new("https://example.com", CrawlOptions::default());

        let wrong = Crawl4AiClient::with_client(Client::new(), &mock_server.uri(), "wrong");
        let err = wrong.crawl(&request).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Unauthorized);

        let err = client(&mock_server).crawl(&request).await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::HttpStatus(500));
    }

    #[tokio::test]
    async fn test_crawl_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let request = CrawlRequest::new("https://example.com", CrawlOptions::default())
            .with_timeout(Duration::from_millis(200));
        let err = client(&mock_server).crawl(&request).await.unwrap_err();

        assert_eq!(err.kind, BackendErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_crawl_without_result_is_invalid() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crawl_direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
            .mount(&mock_server)
            .await;

        let request = CrawlRequest::new("https://example.com", CrawlOptions::default());
        let err = client(&mock_server).crawl(&request).await.unwrap_err();

        assert_eq!(err.kind, BackendErrorKind::InvalidResponse);
    }
}
