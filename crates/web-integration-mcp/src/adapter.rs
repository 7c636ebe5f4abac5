//! Tool descriptors, argument mapping and output formatting
//!
//! Turns validated MCP arguments into typed backend requests and renders
//! backend results as content blocks for the host.

use std::fmt::Write as _;
use std::time::Duration;

use serde_json::json;
use web_integration_config::CrawlConfig;

use crate::crawl::{CacheMode, CrawlOptions, CrawlRequest, CrawlResult, Link};
use crate::error::InvalidArgument;
use crate::schema::{ParamSpec, ToolDescriptor, ValidatedArgs};
use crate::search::{ResultCount, SearchQuery, SearchResults, TimeRange};
use crate::types::ContentBlock;

pub const SEARCH_TOOL: &str = "search";
pub const CRAWL_TOOL: &str = "crawl";

/// Upper bound for a per-call crawl timeout, in seconds
pub const MAX_CRAWL_TIMEOUT_SECS: i64 = 3600;
/// Upper bound for a per-call post-load wait, in seconds
pub const MAX_WAIT_TIME_SECS: i64 = 600;

pub fn search_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        SEARCH_TOOL,
        "Search the web through a SearxNG instance. Returns titles, URLs and \
         descriptions of the top results in relevance order.",
        vec![
            ParamSpec::string("query", "Search query").required(),
            ParamSpec::integer(
                "count",
                "Number of results to return",
                ResultCount::MIN,
                ResultCount::MAX,
            )
            .default_value(json!(ResultCount::DEFAULT.get()))
            .aliases(&["limit"]),
            ParamSpec::one_of(
                "time_range",
                "Only return results from this period",
                TimeRange::VARIANTS,
            )
            .aliases(&["timeRange"]),
            ParamSpec::integer("page", "Results page, starting at 1", 1, i64::from(u32::MAX))
                .default_value(json!(1))
                .aliases(&["pageno"]),
        ],
    )
}

pub fn crawl_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        CRAWL_TOOL,
        "Crawl a web page with Crawl4AI and return its content as markdown, \
         together with the internal and external links found on it.",
        vec![
            ParamSpec::url("url", "URL to crawl").required(),
            ParamSpec::one_of("cache_mode", "Crawl4AI cache mode", CacheMode::VARIANTS)
                .default_value(json!(CacheMode::default().as_str()))
                .aliases(&["cacheMode"]),
            ParamSpec::string_map(
                "extra_headers",
                "Additional HTTP headers sent to the crawled site",
            )
            .aliases(&["headers", "extraHeaders"]),
            ParamSpec::integer(
                "timeout",
                "Request timeout in seconds; defaults to CRAWL4AI_TIMEOUT",
                1,
                MAX_CRAWL_TIMEOUT_SECS,
            ),
            ParamSpec::boolean(
                "headless",
                "Run the browser headless; defaults to CRAWL4AI_HEADLESS",
            ),
            ParamSpec::boolean(
                "verbose",
                "Verbose crawler logs; defaults to CRAWL4AI_VERBOSE",
            ),
            ParamSpec::integer(
                "word_count_threshold",
                "Minimum words per content block; defaults to CRAWL4AI_WORD_COUNT_THRESHOLD",
                0,
                i64::from(u32::MAX),
            )
            .aliases(&["wordCountThreshold"]),
            ParamSpec::string(
                "wait_for",
                "CSS selector to wait for before extraction; defaults to CRAWL4AI_WAIT_FOR",
            )
            .aliases(&["waitFor"]),
            ParamSpec::integer(
                "wait_time",
                "Seconds to wait after page load; defaults to CRAWL4AI_WAIT_TIME",
                0,
                MAX_WAIT_TIME_SECS,
            )
            .aliases(&["waitTime"]),
        ],
    )
}

/// Build a search query from validated `search` arguments
pub fn search_query(args: &ValidatedArgs) -> Result<SearchQuery, InvalidArgument> {
    let query = args.required_str("query")?;

    let count = match args.integer("count") {
        Some(n) => ResultCount::new(n).ok_or_else(|| {
            InvalidArgument::new(
                "count",
                format!(
                    "must be between {} and {} (got {n})",
                    ResultCount::MIN,
                    ResultCount::MAX
                ),
            )
        })?,
        None => ResultCount::default(),
    };

    let time_range = match args.str("time_range") {
        Some(raw) => TimeRange::parse_filter(raw)
            .map_err(|e| InvalidArgument::new("time_range", e.to_string()))?,
        None => None,
    };

    let page = args
        .integer("page")
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(1);

    Ok(SearchQuery::new(query.trim())
        .with_count(count)
        .with_time_range(time_range)
        .with_page(page))
}

/// Build a crawl request from validated `crawl` arguments and the configured defaults
pub fn crawl_request(
    args: &ValidatedArgs,
    config: &CrawlConfig,
) -> Result<CrawlRequest, InvalidArgument> {
    let url = args.required_str("url")?;

    let cache_mode = match args.str("cache_mode") {
        Some(raw) => raw
            .parse::<CacheMode>()
            .map_err(|e| InvalidArgument::new("cache_mode", e.to_string()))?,
        None => CacheMode::default(),
    };

    let mut request =
        CrawlRequest::new(url, crawl_options(args, config)?).with_cache_mode(cache_mode);
    if let Some(headers) = args.string_map("extra_headers") {
        request = request.with_headers(headers.clone());
    }
    if let Some(secs) = args.integer("timeout") {
        let secs = u64::try_from(secs)
            .map_err(|_| InvalidArgument::new("timeout", "must be positive"))?;
        request = request.with_timeout(Duration::from_secs(secs));
    }

    Ok(request)
}

/// Configured crawl options with any per-call overrides applied
fn crawl_options(
    args: &ValidatedArgs,
    config: &CrawlConfig,
) -> Result<CrawlOptions, InvalidArgument> {
    let mut options = CrawlOptions::from(config);

    if let Some(headless) = args.boolean("headless") {
        options = options.with_headless(headless);
    }
    if let Some(verbose) = args.boolean("verbose") {
        options = options.with_verbose(verbose);
    }
    if let Some(threshold) = args.integer("word_count_threshold") {
        let threshold = u32::try_from(threshold)
            .map_err(|_| InvalidArgument::new("word_count_threshold", "out of range"))?;
        options = options.with_word_count_threshold(threshold);
    }
    if let Some(selector) = args
        .str("wait_for")
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        options = options.with_wait_for(selector);
    }
    if let Some(secs) = args.integer("wait_time") {
        let secs = u64::try_from(secs)
            .map_err(|_| InvalidArgument::new("wait_time", "must not be negative"))?;
        options = options.with_wait_time_secs(secs);
    }

    Ok(options)
}

/// Summary, numbered listing and structured JSON for a search
pub fn format_search(query: &SearchQuery, results: &SearchResults) -> Vec<ContentBlock> {
    let summary = format!(
        "Found {} results (showing top {})",
        results.total_count,
        results.results.len()
    );

    let listing = results
        .results
        .iter()
        .enumerate()
        .map(|(idx, hit)| {
            format!(
                "{}. {}\nURL: {}\nDescription: {}\n",
                idx + 1,
                hit.title,
                hit.url,
                hit.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ContentBlock::Text(summary),
        ContentBlock::Text(listing),
        ContentBlock::Json(json!({
            "query": query.query,
            "results": results.results,
            "total_count": results.total_count,
        })),
    ]
}

/// Readable page dump plus the normalized result as JSON
pub fn format_crawl(result: &CrawlResult) -> Vec<ContentBlock> {
    let mut text = String::new();

    if result.success {
        let _ = writeln!(text, "URL: {}", result.url);
        let _ = writeln!(text, "Content:");
        let _ = writeln!(text, "{}", result.content);
        let _ = writeln!(text, "---");
        let _ = writeln!(text, "\nInternal Links:");
        write_links(&mut text, &result.internal_links);
        let _ = writeln!(text, "\nExternal Links:");
        write_links(&mut text, &result.external_links);
    } else {
        let _ = writeln!(text, "Failed to crawl {}", result.url);
        let _ = writeln!(
            text,
            "Error: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
        let _ = writeln!(text, "---");
    }

    let structured = serde_json::to_value(result).unwrap_or_else(|_| json!({ "url": result.url }));

    vec![
        ContentBlock::Text(text.trim_end().to_string()),
        ContentBlock::Json(structured),
    ]
}

fn write_links(out: &mut String, links: &[Link]) {
    for link in links {
        let _ = write!(out, "- {} ({})", link.text, link.href);
        if let Some(title) = &link.title {
            let _ = write!(out, " [{title}]");
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchHit;
    use serde_json::{Map, Value};

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn search_descriptor_advertises_bounds_and_required_query() {
        let schema = search_descriptor().input_schema();

        assert_eq!(schema["required"], json!(["query"]));
        assert_eq!(schema["properties"]["count"]["minimum"], 1);
        assert_eq!(schema["properties"]["count"]["maximum"], 50);
        assert_eq!(schema["properties"]["count"]["default"], 3);
    }

    #[test]
    fn search_query_accepts_aliases() {
        let validated = search_descriptor()
            .validate(&args(json!({
                "query": " rust ownership ",
                "limit": "5",
                "timeRange": "week"
            })))
            .unwrap();
        let query = search_query(&validated).unwrap();

        assert_eq!(query.query, "rust ownership");
        assert_eq!(query.count.get(), 5);
        assert_eq!(query.time_range, Some(TimeRange::Week));
        assert_eq!(query.page, 1);
    }

    #[test]
    fn search_time_range_none_means_no_filter() {
        let validated = search_descriptor()
            .validate(&args(json!({"query": "q", "time_range": "none"})))
            .unwrap();
        assert_eq!(search_query(&validated).unwrap().time_range, None);
    }

    #[test]
    fn crawl_request_uses_config_defaults() {
        let mut config = CrawlConfig::default();
        config.js_code = vec!["a();".into(), "b();".into()];
        config.wait_time_secs = 2;
        let validated = crawl_descriptor()
            .validate(&args(json!({
                "url": "https://example.com",
                "cacheMode": "BYPASS",
                "headers": {"User-Agent": "test"},
                "timeout": 45
            })))
            .unwrap();
        let request = crawl_request(&validated, &config).unwrap();

        assert_eq!(request.cache_mode, CacheMode::Bypass);
        assert_eq!(request.headers["User-Agent"], "test");
        assert_eq!(request.timeout, Some(Duration::from_secs(45)));
        assert_eq!(request.options.js_code, vec!["a();", "b();"]);
        assert_eq!(request.options.wait_time_secs, 2);
    }

    #[test]
    fn crawl_options_can_be_overridden_per_call() {
        let mut config = CrawlConfig::default();
        config.wait_for = Some("#config".into());
        let validated = crawl_descriptor()
            .validate(&args(json!({
                "url": "https://example.com",
                "headless": "false",
                "verbose": true,
                "wordCountThreshold": 25,
                "wait_for": "#main",
                "waitTime": 4
            })))
            .unwrap();
        let options = crawl_request(&validated, &config).unwrap().options;

        assert!(!options.headless);
        assert!(options.verbose);
        assert_eq!(options.word_count_threshold, 25);
        assert_eq!(options.wait_for.as_deref(), Some("#main"));
        assert_eq!(options.wait_time_secs, 4);
    }

    #[test]
    fn wait_time_above_limit_is_rejected() {
        let err = crawl_descriptor()
            .validate(&args(json!({"url": "https://example.com", "wait_time": 601})))
            .unwrap_err();
        assert_eq!(err.field, "wait_time");
    }

    #[test]
    fn large_page_numbers_are_accepted() {
        let validated = search_descriptor()
            .validate(&args(json!({"query": "rust", "page": 250})))
            .unwrap();
        assert_eq!(search_query(&validated).unwrap().page, 250);
    }

    #[test]
    fn crawl_rejects_non_http_urls() {
        let err = crawl_descriptor()
            .validate(&args(json!({"url": "file:///etc/passwd"})))
            .unwrap_err();
        assert_eq!(err.field, "url");
    }

    #[test]
    fn format_search_lists_hits_in_order() {
        let query = SearchQuery::new("rust");
        let results = SearchResults {
            results: vec![
                SearchHit {
                    title: "First".into(),
                    url: "https://a".into(),
                    description: "one".into(),
                },
                SearchHit {
                    title: "Second".into(),
                    url: "https://b".into(),
                    description: "two".into(),
                },
            ],
            total_count: 7,
        };

        let blocks = format_search(&query, &results);

        assert_eq!(blocks[0].as_text(), Some("Found 7 results (showing top 2)"));
        assert_eq!(
            blocks[1].as_text(),
            Some("1. First\nURL: https://a\nDescription: one\n\n2. Second\nURL: https://b\nDescription: two\n")
        );
        let json = blocks[2].as_json().unwrap();
        assert_eq!(json["query"], "rust");
        assert_eq!(json["results"][1]["title"], "Second");
        assert_eq!(json["total_count"], 7);
    }

    #[test]
    fn format_crawl_renders_links() {
        let result = CrawlResult {
            url: "https://example.com".into(),
            content: "Hello".into(),
            success: true,
            error: None,
            internal_links: vec![Link {
                href: "https://example.com/a".into(),
                text: "A".into(),
                title: Some("Page A".into()),
            }],
            external_links: vec![Link {
                href: "https://other.org".into(),
                text: "Other".into(),
                title: None,
            }],
            metadata: None,
        };

        let blocks = format_crawl(&result);
        let text = blocks[0].as_text().unwrap();

        assert!(text.starts_with("URL: https://example.com\nContent:\nHello\n---"));
        assert!(text.contains("- A (https://example.com/a) [Page A]"));
        assert!(text.ends_with("- Other (https://other.org)"));
        assert_eq!(blocks[1].as_json().unwrap()["success"], true);
    }

    #[test]
    fn format_crawl_reports_backend_failure() {
        let result = CrawlResult {
            url: "https://nope.invalid".into(),
            content: String::new(),
            success: false,
            error: Some("DNS failure".into()),
            internal_links: vec![],
            external_links: vec![],
            metadata: None,
        };

        let blocks = format_crawl(&result);

        assert_eq!(
            blocks[0].as_text(),
            Some("Failed to crawl https://nope.invalid\nError: DNS failure\n---")
        );
    }
}
