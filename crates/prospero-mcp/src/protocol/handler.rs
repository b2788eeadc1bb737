//! Main request dispatcher: receives JSON-RPC messages, routes to handlers.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::prompts::PromptRegistry;
use crate::session::SessionState;
use crate::types::*;

use super::negotiation::negotiate;

/// The methods this server understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    Initialized,
    PromptsList,
    PromptsGet,
    Unknown(String),
}

impl McpMethod {
    pub fn parse(method: &str) -> Self {
        match method {
            "initialize" => McpMethod::Initialize,
            "initialized" => McpMethod::Initialized,
            "prompts/list" => McpMethod::PromptsList,
            "prompts/get" => McpMethod::PromptsGet,
            other => McpMethod::Unknown(other.to_string()),
        }
    }

    /// Whether the method is gated behind the `initialized` notification.
    pub fn requires_initialization(&self) -> bool {
        matches!(self, McpMethod::PromptsList | McpMethod::PromptsGet)
    }
}

/// The protocol handler that dispatches incoming JSON-RPC messages.
///
/// Holds no per-client state: the caller passes the session the message
/// belongs to, so one handler can serve many HTTP clients.
pub struct ProtocolHandler {
    registry: Arc<PromptRegistry>,
    server_info: ServerInfo,
}

impl ProtocolHandler {
    pub fn new(registry: Arc<PromptRegistry>) -> Self {
        Self::with_server_info(registry, default_server_info())
    }

    pub fn with_server_info(registry: Arc<PromptRegistry>, server_info: ServerInfo) -> Self {
        Self {
            registry,
            server_info,
        }
    }

    pub fn registry(&self) -> &PromptRegistry {
        &self.registry
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Handle one message. Returns `None` for notifications, whatever the
    /// outcome, and for methods that never answer (`initialized`).
    pub async fn handle_message(
        &self,
        session: &SessionState,
        request: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let method = McpMethod::parse(&request.method);
        tracing::debug!("Dispatching {} (id: {:?})", request.method, request.id);

        let result = self.dispatch(session, &method, request.params, cancel).await;

        let Some(id) = request.id else {
            if let Err(e) = result {
                tracing::debug!("Notification {} failed: {e}", request.method);
            }
            return None;
        };

        match result {
            Ok(Some(value)) => Some(JsonRpcResponse::success(id, value)),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Request {id} failed: {e}");
                Some(e.to_json_rpc_error(id))
            }
        }
    }

    async fn dispatch(
        &self,
        session: &SessionState,
        method: &McpMethod,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> McpResult<Option<Value>> {
        if method.requires_initialization() && !session.is_initialized() {
            return Err(McpError::NotInitialized);
        }

        match method {
            McpMethod::Initialize => self.handle_initialize(params).map(Some),
            McpMethod::Initialized => {
                if session.mark_initialized() {
                    tracing::info!("MCP handshake complete");
                }
                Ok(None)
            }
            McpMethod::PromptsList => self.handle_prompts_list().map(Some),
            McpMethod::PromptsGet => self.handle_prompts_get(params, cancel).await.map(Some),
            McpMethod::Unknown(name) => Err(McpError::MethodNotFound(name.clone())),
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = parse_params(params)?;
        let result = negotiate(&init_params, &self.server_info);

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_prompts_list(&self) -> McpResult<Value> {
        let result = PromptListResult {
            prompts: self.registry.list(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_prompts_get(
        &self,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> McpResult<Value> {
        let get_params: PromptGetParams = parse_params(params)?;
        let args = get_params.arguments.unwrap_or_default();

        let result = self
            .registry
            .execute(cancel.clone(), &get_params.name, args)
            .await
            .map_err(|e| match e {
                McpError::InternalError(_) => e,
                other => McpError::InternalError(other.to_string()),
            })?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

/// Decode method params. Absent or `null` params yield the defaults; any
/// non-object value is rejected.
fn parse_params<T: DeserializeOwned + Default>(params: Option<Value>) -> McpResult<T> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(|e| McpError::InvalidParams(e.to_string()))
        }
        Some(other) => Err(McpError::InvalidParams(format!(
            "params must be an object, got {other}"
        ))),
    }
}
