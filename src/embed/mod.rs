//! Sentence embedding backends.
//!
//! Both backends are deterministic for a given model and input, and both are
//! built once at startup and shared by reference afterwards.

use crate::Result;

pub mod minilm;
pub mod openai;

pub use minilm::MiniLmEmbedder;
pub use openai::OpenAiEmbedder;

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Maps text to fixed-dimension vectors.
pub trait Embedder {
    /// Embeds a single text.
    fn embed_one(&self, text: &str) -> Result<Embedding>;

    /// Embeds several texts, preserving input order.
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Output dimension, fixed once the model is loaded.
    fn dimension(&self) -> usize;

    /// Model identifier.
    fn model_name(&self) -> &str;
}
