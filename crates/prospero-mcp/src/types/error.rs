//! Error types and JSON-RPC error codes for the MCP server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::{JsonRpcResponse, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    /// A content method was called before the `initialized` notification.
    pub const SERVER_NOT_INITIALIZED: i32 = -32002;
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Server not initialized")]
    NotInitialized,

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Request cancelled")]
    RequestCancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Prompt loading failed: {0}")]
    Prompts(#[from] prospero_prompts::PromptsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) | McpError::Json(_) => PARSE_ERROR,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::NotInitialized => SERVER_NOT_INITIALIZED,
            McpError::InternalError(_)
            | McpError::PromptNotFound(_)
            | McpError::RequestCancelled
            | McpError::Transport(_)
            | McpError::Prompts(_)
            | McpError::Io(_) => INTERNAL_ERROR,
        }
    }

    /// The fixed, client-facing message for this error's code.
    pub fn message(&self) -> &'static str {
        match self.code() {
            error_codes::PARSE_ERROR => "Parse error",
            error_codes::METHOD_NOT_FOUND => "Method not found",
            error_codes::INVALID_PARAMS => "Invalid params",
            mcp_error_codes::SERVER_NOT_INITIALIZED => "Server not initialized",
            _ => "Internal error",
        }
    }

    /// Detail attached as `data`.
    ///
    /// Handler-level failures carry their full message; protocol errors
    /// carry the offending method or parser detail.
    pub fn data(&self) -> Option<Value> {
        match self {
            McpError::NotInitialized => None,
            McpError::ParseError(detail)
            | McpError::MethodNotFound(detail)
            | McpError::InvalidParams(detail)
            | McpError::InternalError(detail) => Some(Value::String(detail.clone())),
            other => Some(Value::String(other.to_string())),
        }
    }

    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject {
            code: self.code(),
            message: self.message().to_string(),
            data: self.data(),
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcResponse {
        JsonRpcResponse::error(id, self.to_error_object())
    }
}

pub type McpResult<T> = Result<T, McpError>;
