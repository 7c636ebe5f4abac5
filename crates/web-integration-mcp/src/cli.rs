use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;
use web_integration_config::inputs::{CRAWL4AI_URL, SEARXNG_URL};
use web_integration_config::ConfigInputs;

/// Log level options for the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "web-integration-mcp")]
#[command(about = "MCP server exposing SearxNG search and Crawl4AI crawling over stdio")]
#[command(version)]
pub struct Cli {
    /// SearxNG base URL (overrides SEARXNG_URL)
    #[arg(long)]
    pub searxng_url: Option<String>,

    /// Crawl4AI base URL (overrides CRAWL4AI_URL)
    #[arg(long)]
    pub crawl4ai_url: Option<String>,

    /// Log level; logs always go to stderr
    #[arg(short = 'l', long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Shorthand for `--log-level debug`
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn level(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => LevelFilter::DEBUG,
            (None, false) => LevelFilter::INFO,
        }
    }

    /// Apply command-line overrides on top of `inputs`
    pub fn overlay(&self, mut inputs: ConfigInputs) -> ConfigInputs {
        if let Some(url) = &self.searxng_url {
            inputs.set(SEARXNG_URL, url.as_str());
        }
        if let Some(url) = &self.crawl4ai_url {
            inputs.set(CRAWL4AI_URL, url.as_str());
        }
        inputs
    }
}
