//! MCP adapter for SearxNG web search and Crawl4AI page crawling
//!
//! Two tools are exposed to an MCP host over stdio:
//!
//! - `search`: queries a SearxNG instance and returns the top results
//! - `crawl`: fetches one page through Crawl4AI and returns it as markdown
//!
//! [`ToolRegistry`] holds the tool descriptors and dispatches validated calls
//! to the backend clients; [`WebIntegrationService`] wraps it as an rmcp
//! `ServerHandler`.

pub mod adapter;
pub mod cli;
pub mod crawl;
pub mod error;
pub mod registry;
pub mod schema;
pub mod search;
pub mod service;
pub mod types;

pub use crawl::{CacheMode, Crawl4AiClient, CrawlOptions, CrawlRequest, CrawlResult, Link};
pub use error::{BackendError, BackendErrorKind, InvalidArgument, ToolError, ToolErrorKind};
pub use registry::ToolRegistry;
pub use schema::{ParamSpec, ToolDescriptor, ValidatedArgs};
pub use search::{ResultCount, SearchHit, SearchQuery, SearchResults, SearxngClient, TimeRange};
pub use service::{WebIntegrationService, SERVER_NAME};
pub use types::{ContentBlock, ToolCallRequest, ToolCallResult};
