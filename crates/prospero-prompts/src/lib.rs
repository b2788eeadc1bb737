//! Prospero prompts: prompt definitions and template rendering.

pub mod loader;
pub mod template;
pub mod types;

pub use loader::{load_definitions, load_file};
pub use template::render;
pub use types::*;
