//! Shared fixtures for dispatch tests against mocked backends

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use web_integration_config::inputs::{CRAWL4AI_API_TOKEN, CRAWL4AI_URL, SEARXNG_URL};
use web_integration_config::{ConfigInputs, WebIntegrationConfig};
use web_integration_mcp::{ToolCallRequest, ToolRegistry};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

/// Registry whose backends both point at `server`
pub fn registry_for(server: &MockServer) -> ToolRegistry {
    registry_with(
        ConfigInputs::new()
            .with(SEARXNG_URL, server.uri())
            .with(CRAWL4AI_URL, server.uri())
            .with(CRAWL4AI_API_TOKEN, TEST_TOKEN),
    )
}

pub fn registry_with(inputs: ConfigInputs) -> ToolRegistry {
    let config = WebIntegrationConfig::resolve(&inputs).expect("test inputs resolve");
    ToolRegistry::new(Arc::new(config))
}

pub fn call(tool: &str, arguments: Value) -> ToolCallRequest {
    ToolCallRequest::from_value(tool, arguments)
}

pub fn searxng_results(count: usize) -> Value {
    let results: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "title": format!("Result {i}"),
                "url": format!("https://example.com/{i}"),
                "content": format!("Description {i}"),
            })
        })
        .collect();
    json!({ "query": "test", "results": results })
}

pub fn crawl_success(markdown: &str) -> Value {
    json!({
        "result": {
            "markdown": markdown,
            "success": true,
            "links": {
                "internal": [{"href": "https://example.com/about", "text": "About", "title": ""}],
                "external": [{"href": "https://rust-lang.org", "text": "Rust", "title": "Rust"}]
            }
        }
    })
}
