//! Prospero MCP server: parameterised prompts for agent clients over stdio and Streamable HTTP.

pub mod config;
pub mod prompts;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

pub use config::{load_prompt_registry, resolve_prompts_path};
pub use prompts::{PromptHandler, PromptRegistry};
pub use protocol::ProtocolHandler;
pub use session::SessionState;
pub use transport::StdioTransport;
