//! MCP prompt registry and definition-backed handlers.

pub mod registry;
pub mod template;

pub use registry::{PromptArguments, PromptHandler, PromptRegistry};
pub use template::{TemplateHandler, UnimplementedHandler};
