// crates/web-integration-mcp/src/types.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolErrorKind};

/// A tool invocation as received from the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Build a request from a JSON value; anything but an object means "no arguments"
    pub fn from_value(tool_name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(tool_name, arguments)
    }
}

/// One block of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContentBlock {
    Text(String),
    Json(Value),
}

impl ContentBlock {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(text),
            ContentBlock::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ContentBlock::Json(value) => Some(value),
            ContentBlock::Text(_) => None,
        }
    }
}

/// Outcome of a tool call; dispatch always produces one of these
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallResult {
    Success { content: Vec<ContentBlock> },
    Failure { kind: ToolErrorKind, message: String },
}

impl ToolCallResult {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        ToolCallResult::Success { content }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolCallResult::Success { .. })
    }

    /// Failure kind, if this is a failure
    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match self {
            ToolCallResult::Failure { kind, .. } => Some(*kind),
            ToolCallResult::Success { .. } => None,
        }
    }

    pub fn content(&self) -> &[ContentBlock] {
        match self {
            ToolCallResult::Success { content } => content,
            ToolCallResult::Failure { .. } => &[],
        }
    }
}

impl From<ToolError> for ToolCallResult {
    fn from(error: ToolError) -> Self {
        ToolCallResult::Failure {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, BackendErrorKind};
    use serde_json::json;

    #[test]
    fn from_value_ignores_non_objects() {
        let request = ToolCallRequest::from_value("search", json!(["not", "an", "object"]));
        assert!(request.arguments.is_empty());
    }

    #[test]
    fn request_deserializes_without_arguments() {
        let request: ToolCallRequest = serde_json::from_value(json!({"tool_name": "crawl"})).unwrap();
        assert_eq!(request.tool_name, "crawl");
        assert!(request.arguments.is_empty());
    }

    #[test]
    fn tool_error_flattens_into_failure() {
        let error = ToolError::from(BackendError::new(
            "crawl4ai",
            BackendErrorKind::Unauthorized,
            "401 Unauthorized",
        ));
        let result = ToolCallResult::from(error);

        assert!(!result.is_success());
        assert_eq!(
            result.error_kind(),
            Some(ToolErrorKind::BackendFailure(BackendErrorKind::Unauthorized))
        );
        assert!(result.content().is_empty());
    }
}
