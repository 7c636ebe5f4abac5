use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use web_integration_config::{ConfigInputs, WebIntegrationConfig};
use web_integration_mcp::cli::Cli;
use web_integration_mcp::WebIntegrationService;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP protocol, so logs go to stderr
    let level = cli.level();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "web_integration_mcp={level},web_integration_config={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let inputs = cli.overlay(ConfigInputs::from_env());
    let config = WebIntegrationConfig::resolve(&inputs)
        .context("Failed to load web integration configuration")?;

    info!("Starting MCP web integration server");
    info!(
        "  SearxNG: {}",
        config.search.base_url().unwrap_or("<not configured>")
    );
    info!("  Crawl4AI: {}", config.crawl.base_url);

    WebIntegrationService::new(Arc::new(config))
        .serve_stdio()
        .await
        .context("MCP server terminated with an error")
}
