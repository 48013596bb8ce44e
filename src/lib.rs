#![warn(missing_docs)]
//! Retrieval-augmented assistant that answers questions about one résumé.
//!
//! The offline path loads a PDF, splits it into overlapping chunks, embeds
//! them and upserts them into a vector index. The online path embeds a
//! question, retrieves the closest chunks, merges them with fixed profile
//! metadata into a prompt and asks a hosted chat model.

pub mod assistant;
pub mod chunker;
pub mod config;
pub mod embed;
pub mod env_check;
pub mod error;
pub mod llm;
pub mod loader;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod store;

pub use assistant::{AnswerOptions, Assistant, APOLOGY};
pub use chunker::{Chunk, ChunkConfig, Chunker};
pub use embed::{Embedder, Embedding, MiniLmEmbedder, OpenAiEmbedder};
pub use env_check::EnvReport;
pub use error::{Error, Result};
pub use llm::{ChatCompletionsProvider, LlmProvider, ProviderRequest};
pub use metadata::ProfileMetadata;
pub use pipeline::{ingest_document, ingest_pdf, ingest_text, IngestOptions, IngestReport};
pub use session::{ChatSession, SessionState};
pub use store::{
    IndexProvisioner, IndexSpec, IndexStatus, IndexTarget, MemoryStore, PineconeClient,
    PineconeIndex, QueryMatch, VectorIndex, VectorRecord,
};
