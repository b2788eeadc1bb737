//! MCP capability negotiation during initialization.

use crate::types::{InitializeParams, InitializeResult, ServerInfo, MCP_VERSION};

/// Build the `initialize` result.
///
/// The server speaks exactly one protocol revision and always answers with
/// it; a different client request is only logged.
pub fn negotiate(params: &InitializeParams, server_info: &ServerInfo) -> InitializeResult {
    if !params.protocol_version.is_empty() && params.protocol_version != MCP_VERSION {
        tracing::warn!(
            "Client requested protocol version {}, server supports {}. Proceeding with server version.",
            params.protocol_version,
            MCP_VERSION
        );
    }

    if params.client_info.name.is_empty() {
        tracing::info!("Initialize from anonymous client");
    } else {
        tracing::info!(
            "Initialize from client: {} v{}",
            params.client_info.name,
            params.client_info.version
        );
    }

    InitializeResult::for_server(server_info)
}
