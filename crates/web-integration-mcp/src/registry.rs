//! Tool registry and dispatch
//!
//! The registry owns the tool descriptors, the shared configuration and one
//! lazily-built client per backend. [`ToolRegistry::dispatch`] never fails:
//! every error is flattened into a [`ToolCallResult::Failure`].

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use web_integration_config::WebIntegrationConfig;

use crate::adapter::{
    crawl_descriptor, crawl_request, format_crawl, format_search, search_descriptor,
    search_query, CRAWL_TOOL, SEARCH_TOOL,
};
use crate::crawl::Crawl4AiClient;
use crate::error::{BackendError, ToolError};
use crate::schema::ToolDescriptor;
use crate::search::SearxngClient;
use crate::types::{ContentBlock, ToolCallRequest, ToolCallResult};

pub struct ToolRegistry {
    config: Arc<WebIntegrationConfig>,
    search: ToolDescriptor,
    crawl: ToolDescriptor,
    searxng: OnceCell<SearxngClient>,
    crawl4ai: OnceCell<Crawl4AiClient>,
}

impl ToolRegistry {
    pub fn new(config: Arc<WebIntegrationConfig>) -> Self {
        Self {
            config,
            search: search_descriptor(),
            crawl: crawl_descriptor(),
            searxng: OnceCell::new(),
            crawl4ai: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &WebIntegrationConfig {
        &self.config
    }

    /// All registered tools, in listing order
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        vec![&self.search, &self.crawl]
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        match name {
            SEARCH_TOOL => Some(&self.search),
            CRAWL_TOOL => Some(&self.crawl),
            _ => None,
        }
    }

    /// Execute one tool call
    pub async fn dispatch(&self, request: ToolCallRequest) -> ToolCallResult {
        let tool = request.tool_name.clone();
        info!("Tool call: {}", tool);

        match self.run(request).await {
            Ok(content) => {
                debug!(tool = %tool, blocks = content.len(), "Tool call succeeded");
                ToolCallResult::success(content)
            }
            Err(error) => {
                warn!(tool = %tool, kind = %error.kind(), "Tool call failed: {}", error);
                ToolCallResult::from(error)
            }
        }
    }

    /// Execute one tool call unless `cancelled` resolves first
    ///
    /// Losing the race drops the in-flight backend request. Unknown tools are
    /// reported as such even when the call is already cancelled.
    pub async fn dispatch_until<F>(&self, request: ToolCallRequest, cancelled: F) -> ToolCallResult
    where
        F: Future<Output = ()>,
    {
        let backend = match request.tool_name.as_str() {
            SEARCH_TOOL => "searxng",
            CRAWL_TOOL => "crawl4ai",
            _ => return self.dispatch(request).await,
        };
        let tool = request.tool_name.clone();

        tokio::select! {
            biased;
            () = cancelled => {
                info!(tool = %tool, "Tool call cancelled by host");
                ToolCallResult::from(ToolError::from(BackendError::cancelled(backend)))
            }
            result = self.dispatch(request) => result,
        }
    }

    async fn run(&self, request: ToolCallRequest) -> Result<Vec<ContentBlock>, ToolError> {
        match request.tool_name.as_str() {
            SEARCH_TOOL => {
                let args = self.search.validate(&request.arguments)?;
                let query = search_query(&args)?;
                let client = self.searxng_client().await?;
                let results = client.search(&query).await?;
                Ok(format_search(&query, &results))
            }
            CRAWL_TOOL => {
                let args = self.crawl.validate(&request.arguments)?;
                let crawl = crawl_request(&args, &self.config.crawl)?;
                let client = self.crawl4ai_client().await?;
                let result = client.crawl(&crawl).await?;
                Ok(format_crawl(&result))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn searxng_client(&self) -> Result<&SearxngClient, ToolError> {
        self.searxng
            .get_or_try_init(|| async {
                let client = SearxngClient::from_config(&self.config.search)?;
                debug!(base_url = client.base_url(), "Initialized SearxNG client");
                Ok::<_, ToolError>(client)
            })
            .await
    }

    async fn crawl4ai_client(&self) -> Result<&Crawl4AiClient, ToolError> {
        self.crawl4ai
            .get_or_try_init(|| async {
                let client = Crawl4AiClient::from_config(&self.config.crawl)?;
                debug!(base_url = client.base_url(), "Initialized Crawl4AI client");
                Ok::<_, ToolError>(client)
            })
            .await
    }
}
