//! Error types for backend calls and tool dispatch

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;
use web_integration_config::{ConfigError, ConfigErrorKind};

/// Why a backend call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// Connection refused, DNS failure or other transport problem
    Unreachable,
    /// The backend answered with a non-success status
    HttpStatus(u16),
    /// No answer within the configured timeout
    Timeout,
    /// The backend rejected our credentials (401/403)
    Unauthorized,
    /// The host cancelled the call while it was in flight
    Cancelled,
    /// A success status whose body is not the documented JSON shape
    InvalidResponse,
    /// The request could not be built locally (bad URL or header); nothing was sent
    InvalidRequest,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::Unreachable => write!(f, "unreachable"),
            BackendErrorKind::HttpStatus(code) => write!(f, "HTTP {code}"),
            BackendErrorKind::Timeout => write!(f, "timeout"),
            BackendErrorKind::Unauthorized => write!(f, "unauthorized"),
            BackendErrorKind::Cancelled => write!(f, "cancelled"),
            BackendErrorKind::InvalidResponse => write!(f, "invalid response"),
            BackendErrorKind::InvalidRequest => write!(f, "invalid request"),
        }
    }
}

/// A failed call to SearxNG or Crawl4AI
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{backend} {kind}: {detail}")]
pub struct BackendError {
    pub backend: &'static str,
    pub kind: BackendErrorKind,
    pub detail: String,
}

impl BackendError {
    pub fn new(backend: &'static str, kind: BackendErrorKind, detail: impl Into<String>) -> Self {
        Self {
            backend,
            kind,
            detail: detail.into(),
        }
    }

    /// Classify a transport-level reqwest failure
    pub fn from_transport(backend: &'static str, error: reqwest::Error) -> Self {
        let kind = if error.is_builder() {
            BackendErrorKind::InvalidRequest
        } else if error.is_timeout() {
            BackendErrorKind::Timeout
        } else if error.is_decode() {
            BackendErrorKind::InvalidResponse
        } else {
            BackendErrorKind::Unreachable
        };
        Self::new(backend, kind, error.to_string())
    }

    /// Classify a non-success HTTP status
    pub fn from_status(backend: &'static str, status: StatusCode, body: &str) -> Self {
        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendErrorKind::Unauthorized,
            other => BackendErrorKind::HttpStatus(other.as_u16()),
        };
        let detail = match body.trim() {
            "" => status.to_string(),
            text => format!("{status}: {}", truncate(text, 300)),
        };
        Self::new(backend, kind, detail)
    }

    pub fn cancelled(backend: &'static str) -> Self {
        Self::new(backend, BackendErrorKind::Cancelled, "request cancelled by host")
    }
}

/// Result type for backend client operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// An argument that failed schema validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct InvalidArgument {
    pub field: String,
    pub reason: String,
}

impl InvalidArgument {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Machine-readable category of a failed tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolErrorKind {
    UnknownTool,
    InvalidArgument,
    Config(ConfigErrorKind),
    BackendFailure(BackendErrorKind),
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolErrorKind::UnknownTool => write!(f, "unknown_tool"),
            ToolErrorKind::InvalidArgument => write!(f, "invalid_argument"),
            ToolErrorKind::Config(ConfigErrorKind::MissingRequired) => {
                write!(f, "config_missing_required")
            }
            ToolErrorKind::Config(ConfigErrorKind::MalformedValue) => {
                write!(f, "config_malformed_value")
            }
            ToolErrorKind::BackendFailure(kind) => write!(f, "backend_failure ({kind})"),
        }
    }
}

/// Any failure a tool call can end in, before it is flattened into a result
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument {0}")]
    InvalidArgument(#[from] InvalidArgument),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::UnknownTool(_) => ToolErrorKind::UnknownTool,
            ToolError::InvalidArgument(_) => ToolErrorKind::InvalidArgument,
            ToolError::Config(e) => ToolErrorKind::Config(e.kind()),
            ToolError::Backend(e) => ToolErrorKind::BackendFailure(e.kind),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
