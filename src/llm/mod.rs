//! Hosted chat-completion providers.

use crate::Result;

pub mod chat;

pub use chat::ChatCompletionsProvider;

/// Trait implemented by concrete LLM providers.
pub trait LlmProvider {
    /// Sends one system turn plus one user turn and returns the reply text.
    fn complete(&self, request: &ProviderRequest) -> Result<String>;
}

/// Request envelope shared by the various providers.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRequest<'a> {
    /// Persona turn.
    pub system: &'a str,
    /// Fully rendered user turn.
    pub prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
}
