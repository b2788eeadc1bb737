//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use crate::prompts::PromptRegistry;
use crate::types::McpResult;

/// Environment variable naming the prompt definitions path.
pub const PROMPTS_ENV: &str = "PROSPERO_PROMPTS";

/// Resolve the prompt definitions path.
///
/// Order: explicit flag, `PROSPERO_PROMPTS`, `./prompts` if present, then
/// `~/.prospero/prompts`.
pub fn resolve_prompts_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var(PROMPTS_ENV) {
        return PathBuf::from(env_path);
    }

    let cwd_prompts = PathBuf::from("prompts");
    if cwd_prompts.exists() {
        return cwd_prompts;
    }

    resolve_default_prompts_path()
}

fn resolve_default_prompts_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home).join(".prospero").join("prompts")
}

/// Load the definitions at `path` into a registry.
///
/// A missing path gives an empty registry; unreadable or invalid
/// definitions are an error.
pub fn load_prompt_registry(path: &Path) -> McpResult<PromptRegistry> {
    if !path.exists() {
        tracing::warn!(
            "No prompt definitions at {}, serving an empty prompt list",
            path.display()
        );
        return Ok(PromptRegistry::new());
    }

    let definitions = prospero_prompts::load_definitions(path)?;

    tracing::info!("Loaded {} prompts from {}", definitions.len(), path.display());
    for def in &definitions {
        tracing::info!("  - {}: {}", def.name, def.description);
    }

    Ok(PromptRegistry::from_definitions(&definitions))
}
