//! Handlers backed by prompt definitions.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use prospero_prompts::{render, PromptDefinition};

use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

use super::registry::{PromptArguments, PromptHandler};

/// Renders a definition's `{{argument}}` template into a single user message.
pub struct TemplateHandler {
    name: String,
    description: String,
    content: String,
}

impl TemplateHandler {
    pub fn from_definition(def: &PromptDefinition) -> Self {
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            content: def.content.clone().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PromptHandler for TemplateHandler {
    async fn get(
        &self,
        cancel: CancellationToken,
        args: PromptArguments,
    ) -> McpResult<PromptGetResult> {
        if cancel.is_cancelled() {
            return Err(McpError::RequestCancelled);
        }

        if self.content.is_empty() {
            return Err(McpError::InternalError(format!(
                "no content available for prompt: {}",
                self.name
            )));
        }

        let text = render(&self.content, &args);

        Ok(PromptGetResult {
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            messages: vec![PromptMessage::user(text)],
        })
    }
}

/// Stands in for prompts whose definition has no content and no handler.
pub struct UnimplementedHandler {
    name: String,
}

impl UnimplementedHandler {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl PromptHandler for UnimplementedHandler {
    async fn get(
        &self,
        _cancel: CancellationToken,
        _args: PromptArguments,
    ) -> McpResult<PromptGetResult> {
        Err(McpError::InternalError(format!(
            "handler not implemented for prompt: {}",
            self.name
        )))
    }
}
