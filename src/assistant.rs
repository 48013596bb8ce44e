//! Question answering over the résumé index.

use crate::embed::Embedder;
use crate::llm::{LlmProvider, ProviderRequest};
use crate::metadata::ProfileMetadata;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::store::VectorIndex;
use crate::Result;

/// Reply shown when a turn fails.
pub const APOLOGY: &str =
    "Perdón, no pude generar una respuesta en este momento. Probá de nuevo en unos minutos.";

/// Retrieval and decoding knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerOptions {
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum completion tokens.
    pub max_tokens: usize,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            temperature: 0.2,
            max_tokens: 600,
        }
    }
}

/// Wires the embedder, index, profile and LLM built at startup.
pub struct Assistant<'a> {
    embedder: &'a dyn Embedder,
    index: &'a dyn VectorIndex,
    llm: &'a dyn LlmProvider,
    metadata: &'a ProfileMetadata,
    options: AnswerOptions,
}

impl<'a> Assistant<'a> {
    /// Borrows the shared resources for the lifetime of the session.
    pub fn new(
        embedder: &'a dyn Embedder,
        index: &'a dyn VectorIndex,
        llm: &'a dyn LlmProvider,
        metadata: &'a ProfileMetadata,
        options: AnswerOptions,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            metadata,
            options,
        }
    }

    /// Texts of the closest chunks, best first.
    pub fn retrieve(&self, question: &str) -> Result<Vec<String>> {
        let vector = self.embedder.embed_one(question)?;
        let matches = self.index.query(&vector, self.options.top_k)?;
        tracing::debug!("retrieved {} chunks", matches.len());
        Ok(matches
            .iter()
            .map(|hit| hit.text().to_string())
            .filter(|text| !text.is_empty())
            .collect())
    }

    /// Prompt that would be sent for `question`.
    pub fn prompt_for(&self, question: &str) -> Result<String> {
        let chunks = self.retrieve(question)?;
        Ok(build_prompt(question, &chunks, self.metadata))
    }

    /// Retrieves, builds the prompt and asks the model. Errors propagate.
    pub fn generate(&self, question: &str) -> Result<String> {
        self.generate_with(question, |_| {})
    }

    /// [`Assistant::generate`], handing the rendered prompt to `on_prompt`
    /// before it is sent.
    pub fn generate_with<F>(&self, question: &str, on_prompt: F) -> Result<String>
    where
        F: FnOnce(&str),
    {
        let prompt = self.prompt_for(question)?;
        on_prompt(&prompt);
        self.llm.complete(&ProviderRequest {
            system: SYSTEM_PROMPT,
            prompt: &prompt,
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        })
    }

    /// Like [`Assistant::generate`], but a failed turn becomes an apology.
    pub fn answer(&self, question: &str) -> String {
        self.answer_with(question, |_| {})
    }

    /// Like [`Assistant::generate_with`], but a failed turn becomes an apology.
    pub fn answer_with<F>(&self, question: &str, on_prompt: F) -> String
    where
        F: FnOnce(&str),
    {
        match self.generate_with(question, on_prompt) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::error!("failed to answer question: {err}");
                APOLOGY.to_string()
            }
        }
    }
}
