//! Core data types for prompt definitions.

use serde::{Deserialize, Serialize};

/// A prompt record as supplied by a definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentDefinition>,
    /// Template text with `{{argumentName}}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One declared argument of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl PromptDefinition {
    /// Create a definition without arguments or content.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: Vec::new(),
            content: None,
        }
    }

    /// Builder-style: append an argument.
    pub fn with_argument(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.arguments.push(ArgumentDefinition {
            name: name.into(),
            description: description.into(),
            required,
        });
        self
    }

    /// Builder-style: set the template content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Whether the definition carries non-empty template text.
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Names of arguments marked as required.
    pub fn required_arguments(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
    }

    /// Check structural invariants: non-empty name, unique argument names.
    pub fn validate(&self) -> PromptsResult<()> {
        if self.name.trim().is_empty() {
            return Err(PromptsError::Invalid("prompt name must not be empty".to_string()));
        }

        for (i, arg) in self.arguments.iter().enumerate() {
            if arg.name.trim().is_empty() {
                return Err(PromptsError::Invalid(format!(
                    "prompt '{}': argument {i} has an empty name",
                    self.name
                )));
            }
            if self.arguments[..i].iter().any(|a| a.name == arg.name) {
                return Err(PromptsError::Invalid(format!(
                    "prompt '{}': duplicate argument '{}'",
                    self.name, arg.name
                )));
            }
        }

        Ok(())
    }
}

/// Errors raised while loading or validating prompt definitions.
#[derive(thiserror::Error, Debug)]
pub enum PromptsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid prompt definition: {0}")]
    Invalid(String),

    #[error("Prompt path not found: {0}")]
    NotFound(String),
}

pub type PromptsResult<T> = Result<T, PromptsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let def: PromptDefinition = serde_json::from_str(r#"{"name":"greet"}"#).unwrap();
        assert_eq!(def.name, "greet");
        assert!(def.description.is_empty());
        assert!(def.arguments.is_empty());
        assert!(!def.has_content());
    }

    #[test]
    fn test_required_arguments() {
        let def = PromptDefinition::new("review", "Review code")
            .with_argument("code", "The code", true)
            .with_argument("style", "Style guide", false);
        let required: Vec<&str> = def.required_arguments().collect();
        assert_eq!(required, vec!["code"]);
    }

    #[test]
    fn test_validate_empty_name() {
        let def = PromptDefinition::new("  ", "blank");
        assert!(matches!(def.validate(), Err(PromptsError::Invalid(_))));
    }

    #[test]
    fn test_validate_duplicate_argument() {
        let def = PromptDefinition::new("dup", "")
            .with_argument("x", "", true)
            .with_argument("x", "", false);
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate argument 'x'"));
    }

    #[test]
    fn test_empty_content_is_not_content() {
        let def = PromptDefinition::new("p", "").with_content("");
        assert!(!def.has_content());
    }
}
