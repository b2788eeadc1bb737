//! Prompt registration and dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use prospero_prompts::PromptDefinition;

use crate::types::{McpError, McpResult, Prompt, PromptGetResult};

use super::template::{TemplateHandler, UnimplementedHandler};

/// Argument values supplied by `prompts/get`, keyed by argument name.
pub type PromptArguments = HashMap<String, String>;

/// Produces the messages of one prompt.
///
/// Handlers receive the caller's cancellation token; long-running handlers
/// should watch it; the registry never interrupts them.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn get(
        &self,
        cancel: CancellationToken,
        args: PromptArguments,
    ) -> McpResult<PromptGetResult>;
}

#[async_trait]
impl<F, Fut> PromptHandler for F
where
    F: Fn(CancellationToken, PromptArguments) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<PromptGetResult>> + Send,
{
    async fn get(
        &self,
        cancel: CancellationToken,
        args: PromptArguments,
    ) -> McpResult<PromptGetResult> {
        (self)(cancel, args).await
    }
}

struct RegisteredPrompt {
    prompt: Prompt,
    handler: Arc<dyn PromptHandler>,
}

/// Name-addressed store of prompt metadata and handlers.
///
/// Metadata and handler live in one entry, so a name is either fully
/// registered or absent.
#[derive(Default)]
pub struct PromptRegistry {
    entries: HashMap<String, RegisteredPrompt>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from loader output.
    ///
    /// Definitions with template content render it; the rest get a handler
    /// that reports it has no implementation.
    pub fn from_definitions(definitions: &[PromptDefinition]) -> Self {
        let mut registry = Self::new();
        for def in definitions {
            let prompt = Prompt::from(def);
            if def.has_content() {
                registry.register(prompt, TemplateHandler::from_definition(def));
            } else {
                registry.register(prompt, UnimplementedHandler::new(&def.name));
            }
        }
        registry
    }

    /// Insert or replace the prompt registered under `prompt.name`.
    pub fn register<H>(&mut self, prompt: Prompt, handler: H)
    where
        H: PromptHandler + 'static,
    {
        self.register_shared(prompt, Arc::new(handler));
    }

    pub fn register_shared(&mut self, prompt: Prompt, handler: Arc<dyn PromptHandler>) {
        if self.entries.contains_key(&prompt.name) {
            tracing::debug!("Replacing prompt '{}'", prompt.name);
        }
        self.entries
            .insert(prompt.name.clone(), RegisteredPrompt { prompt, handler });
    }

    /// Snapshot of every registered prompt, sorted by name.
    pub fn list(&self) -> Vec<Prompt> {
        let mut prompts: Vec<Prompt> = self.entries.values().map(|e| e.prompt.clone()).collect();
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        prompts
    }

    /// Run the handler registered under `name`.
    pub async fn execute(
        &self,
        cancel: CancellationToken,
        name: &str,
        args: PromptArguments,
    ) -> McpResult<PromptGetResult> {
        let handler = self
            .entries
            .get(name)
            .map(|e| Arc::clone(&e.handler))
            .ok_or_else(|| McpError::PromptNotFound(name.to_string()))?;

        handler.get(cancel, args).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
