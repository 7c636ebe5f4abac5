//! rmcp `ServerHandler` exposing the registry over MCP

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use tracing::{debug, info};
use web_integration_config::WebIntegrationConfig;

use crate::registry::ToolRegistry;
use crate::schema::ToolDescriptor;
use crate::types::{ContentBlock, ToolCallRequest, ToolCallResult};

pub const SERVER_NAME: &str = "mcp-web-integration";

#[derive(Clone)]
pub struct WebIntegrationService {
    registry: Arc<ToolRegistry>,
}

impl WebIntegrationService {
    pub fn new(config: Arc<WebIntegrationConfig>) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new(config)),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Tool listing as advertised to the host
    pub fn tools(&self) -> Vec<Tool> {
        self.registry.descriptors().into_iter().map(mcp_tool).collect()
    }

    /// Serve MCP over stdin/stdout until the host disconnects
    pub async fn serve_stdio(self) -> Result<(), anyhow::Error> {
        info!("Starting {} on stdio", SERVER_NAME);

        let service = self
            .serve((tokio::io::stdin(), tokio::io::stdout()))
            .await?;
        let reason = service.waiting().await?;

        info!(?reason, "MCP session ended");
        Ok(())
    }
}

impl ServerHandler for WebIntegrationService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Web Integration MCP Server".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Web search through SearxNG (`search`) and page crawling through \
                 Crawl4AI (`crawl`)."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.tools();
        debug!("Listing {} tools", tools.len());
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.clone().map_or(Value::Null, Value::Object);
        debug!("Calling tool: {} with args: {:?}", request.name, arguments);

        let call = ToolCallRequest::from_value(request.name.to_string(), arguments);
        let result = self
            .registry
            .dispatch_until(call, context.ct.cancelled())
            .await;

        convert_result(result)
    }
}

fn mcp_tool(descriptor: &ToolDescriptor) -> Tool {
    Tool::new(
        descriptor.name,
        descriptor.description,
        descriptor.input_schema_arc(),
    )
}

/// Failures become `is_error` tool results, never protocol errors
fn convert_result(result: ToolCallResult) -> Result<CallToolResult, ErrorData> {
    match result {
        ToolCallResult::Success { content } => {
            let content = content
                .into_iter()
                .map(|block| match block {
                    ContentBlock::Text(text) => Ok(Content::text(text)),
                    ContentBlock::Json(value) => Content::json(value),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CallToolResult::success(content))
        }
        ToolCallResult::Failure { kind, message } => {
            debug!(%kind, "Returning tool error result");
            Ok(CallToolResult::error(vec![Content::text(message)]))
        }
    }
}
