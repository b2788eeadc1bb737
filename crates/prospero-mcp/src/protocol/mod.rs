//! MCP protocol handling: JSON-RPC dispatch.

pub mod handler;
pub mod negotiation;

pub use handler::{McpMethod, ProtocolHandler};
