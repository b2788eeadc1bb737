//! Loading prompt definitions from JSON files.
//!
//! A path may name a single `.json` file or a directory. Each file holds one
//! definition object or an array of them. Directory entries are read in
//! file-name order; non-JSON files and subdirectories are skipped.

use std::path::Path;

use serde::Deserialize;

use crate::types::{PromptDefinition, PromptsError, PromptsResult};

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<PromptDefinition>),
    One(PromptDefinition),
}

/// Load every prompt definition found at `path`.
pub fn load_definitions(path: &Path) -> PromptsResult<Vec<PromptDefinition>> {
    if !path.exists() {
        return Err(PromptsError::NotFound(path.display().to_string()));
    }

    if path.is_file() {
        return load_file(path);
    }

    let mut files: Vec<_> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut definitions = Vec::new();
    for file in files {
        definitions.extend(load_file(&file)?);
    }

    tracing::debug!(
        "Loaded {} prompt definitions from {}",
        definitions.len(),
        path.display()
    );

    Ok(definitions)
}

/// Load the definitions contained in one JSON file.
pub fn load_file(path: &Path) -> PromptsResult<Vec<PromptDefinition>> {
    let data = std::fs::read(path)?;
    let parsed: DefinitionFile =
        serde_json::from_slice(&data).map_err(|source| PromptsError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    let definitions = match parsed {
        DefinitionFile::Many(defs) => defs,
        DefinitionFile::One(def) => vec![def],
    };

    for def in &definitions {
        def.validate()?;
    }

    Ok(definitions)
}
