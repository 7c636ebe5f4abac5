//! Per-tool configuration components

mod crawl;
mod search;

pub use crawl::{CrawlConfig, DEFAULT_CRAWL4AI_URL, DEFAULT_CRAWL_TIMEOUT_SECS};
pub use search::{SearchConfig, DEFAULT_SEARCH_TIMEOUT_SECS};
