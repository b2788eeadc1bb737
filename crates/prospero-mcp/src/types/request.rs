//! MCP request parameter types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptGetParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: Option<HashMap<String, String>>,
}
