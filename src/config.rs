//! Command-line and environment configuration shared by the binaries.
//!
//! Every flag also reads an environment variable, so a `.env` file is enough
//! to run either binary without arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::assistant::AnswerOptions;
use crate::chunker::{ChunkConfig, DEFAULT_MAX_CHARS, DEFAULT_OVERLAP};
use crate::embed::{Embedder, MiniLmEmbedder, OpenAiEmbedder};
use crate::llm::chat::{DEFAULT_CHAT_MODEL, GROQ_BASE_URL};
use crate::llm::ChatCompletionsProvider;
use crate::pipeline::IngestOptions;
use crate::store::pinecone::DEFAULT_CONTROL_URL;
use crate::store::{IndexTarget, PineconeClient, ProvisionPolicy, DEFAULT_UPSERT_BATCH};
use crate::{Error, Result};

/// Index name used when `PINECONE_INDEX` is not set.
pub const DEFAULT_INDEX_NAME: &str = "cv-alumno";

/// Vector store connection settings.
#[derive(Args, Debug, Clone)]
pub struct PineconeArgs {
    /// Pinecone API key
    #[arg(long = "pinecone-api-key", env = "PINECONE_API_KEY", hide_env_values = true)]
    pub pinecone_api_key: Option<String>,

    /// Name of the vector index
    #[arg(long = "index", env = "PINECONE_INDEX", default_value = DEFAULT_INDEX_NAME)]
    pub index: String,

    /// Cloud hosting a newly created serverless index
    #[arg(long = "cloud", env = "PINECONE_CLOUD", default_value = "aws")]
    pub cloud: String,

    /// Region hosting a newly created serverless index
    #[arg(long = "region", env = "PINECONE_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Pinecone control-plane base URL
    #[arg(
        long = "pinecone-control-url",
        env = "PINECONE_CONTROL_URL",
        default_value = DEFAULT_CONTROL_URL
    )]
    pub control_url: String,

    /// Max seconds to wait for each vector store request
    #[arg(long = "pinecone-timeout-secs", default_value_t = 30)]
    pub pinecone_timeout_secs: u64,

    /// Attempts for idempotent vector store calls
    #[arg(long = "pinecone-max-retries", default_value_t = 3)]
    pub pinecone_max_retries: usize,

    /// Max seconds to wait for a new index to become ready
    #[arg(
        long = "provision-timeout-secs",
        env = "PINECONE_PROVISION_TIMEOUT_SECS",
        default_value_t = 120
    )]
    pub provision_timeout_secs: u64,
}

impl PineconeArgs {
    /// The API key, or a configuration error naming the variable.
    pub fn api_key(&self) -> Result<&str> {
        require(self.pinecone_api_key.as_deref(), "PINECONE_API_KEY")
    }

    /// Name and placement of the configured index.
    pub fn target(&self) -> IndexTarget {
        IndexTarget {
            name: self.index.clone(),
            cloud: self.cloud.clone(),
            region: self.region.clone(),
        }
    }

    /// Builds the control-plane client.
    pub fn connect(&self, upsert_batch: usize) -> Result<PineconeClient> {
        if self.index.trim().is_empty() {
            return Err(Error::config("index name must not be empty"));
        }
        Ok(PineconeClient::new(
            self.api_key()?,
            &self.control_url,
            Duration::from_secs(self.pinecone_timeout_secs.max(1)),
            self.pinecone_max_retries,
        )?
        .with_upsert_batch(upsert_batch)
        .with_provision_policy(ProvisionPolicy {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(self.provision_timeout_secs),
        }))
    }
}

/// Answering model settings.
#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Groq API key
    #[arg(long = "groq-api-key", env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Chat model identifier
    #[arg(long = "model", env = "GROQ_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub model: String,

    /// Base URL of the OpenAI-compatible chat API
    #[arg(long = "chat-base-url", env = "GROQ_BASE_URL", default_value = GROQ_BASE_URL)]
    pub chat_base_url: String,

    /// Sampling temperature for the answer model
    #[arg(long, default_value_t = 0.2)]
    pub temperature: f32,

    /// Maximum tokens to request from the completion model
    #[arg(long = "max-tokens", default_value_t = 600)]
    pub max_tokens: usize,

    /// Number of chunks retrieved per question
    #[arg(long = "top-k", default_value_t = 5)]
    pub top_k: usize,

    /// Max seconds to wait for each completion
    #[arg(long = "chat-timeout-secs", default_value_t = 60)]
    pub chat_timeout_secs: u64,
}

impl ChatArgs {
    /// Builds the chat-completion client.
    pub fn connect(&self) -> Result<ChatCompletionsProvider> {
        ChatCompletionsProvider::new(
            require(self.groq_api_key.as_deref(), "GROQ_API_KEY")?,
            &self.chat_base_url,
            self.model.clone(),
            Duration::from_secs(self.chat_timeout_secs.max(1)),
        )
    }

    /// Retrieval and decoding knobs.
    pub fn answer_options(&self) -> Result<AnswerOptions> {
        if self.top_k == 0 {
            return Err(Error::config("top-k must be greater than zero"));
        }
        Ok(AnswerOptions {
            top_k: self.top_k,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

/// Which embedding implementation to load.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EmbeddingBackend {
    /// all-MiniLM-L6-v2 running in-process (default).
    Local,
    /// OpenAI-compatible `/embeddings` endpoint.
    Remote,
}

/// Embedding model settings.
#[derive(Args, Debug, Clone)]
pub struct EmbeddingArgs {
    /// Embedding implementation
    #[arg(
        long = "embedding-backend",
        env = "CV_EMBEDDING_BACKEND",
        value_enum,
        default_value = "local"
    )]
    pub backend: EmbeddingBackend,

    /// Directory caching the local model weights
    #[arg(long = "embedding-cache-dir", env = "FASTEMBED_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// API key for the remote backend
    #[arg(long = "embedding-api-key", env = "EMBEDDING_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    /// Base URL for the remote backend
    #[arg(
        long = "embedding-base-url",
        env = "EMBEDDING_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub embedding_base_url: String,

    /// Remote embedding model identifier
    #[arg(
        long = "embedding-model",
        env = "EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub embedding_model: String,

    /// Optional dimension override for the remote backend
    #[arg(long = "embedding-dimensions", env = "EMBEDDING_DIMENSIONS")]
    pub dimensions: Option<usize>,

    /// Max inputs per remote embedding request
    #[arg(long = "embedding-batch", default_value_t = 64)]
    pub embedding_batch: usize,

    /// Max seconds to wait for each remote embedding request
    #[arg(long = "embedding-timeout-secs", default_value_t = 30)]
    pub embedding_timeout_secs: u64,

    /// Attempts for remote embedding requests
    #[arg(long = "embedding-max-retries", default_value_t = 5)]
    pub embedding_max_retries: usize,
}

impl EmbeddingArgs {
    /// Loads the selected embedder. Expensive; call once per process.
    pub fn load(&self) -> Result<Box<dyn Embedder>> {
        match self.backend {
            EmbeddingBackend::Local => Ok(Box::new(MiniLmEmbedder::load(self.cache_dir.clone())?)),
            EmbeddingBackend::Remote => Ok(Box::new(OpenAiEmbedder::new(
                require(self.embedding_api_key.as_deref(), "EMBEDDING_API_KEY")?.to_string(),
                self.embedding_base_url.clone(),
                self.embedding_model.clone(),
                self.dimensions,
                Duration::from_secs(self.embedding_timeout_secs.max(1)),
                self.embedding_max_retries,
                self.embedding_batch,
            )?)),
        }
    }
}

/// Chunking and batching settings for ingestion.
#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    /// Characters per chunk
    #[arg(long = "chunk-max-chars", env = "CV_CHUNK_MAX_CHARS", default_value_t = DEFAULT_MAX_CHARS)]
    pub max_chars: usize,

    /// Characters shared by consecutive chunks
    #[arg(long = "chunk-overlap", env = "CV_CHUNK_OVERLAP", default_value_t = DEFAULT_OVERLAP)]
    pub overlap: usize,

    /// Chunks embedded and upserted per batch
    #[arg(long = "batch-size", env = "CV_UPSERT_BATCH", default_value_t = DEFAULT_UPSERT_BATCH)]
    pub batch_size: usize,
}

impl ChunkArgs {
    /// Validated ingestion options.
    pub fn options(&self) -> Result<IngestOptions> {
        let chunking = ChunkConfig::new(self.max_chars, self.overlap);
        chunking.validate()?;
        if self.batch_size == 0 {
            return Err(Error::config("batch size must be greater than zero"));
        }
        Ok(IngestOptions {
            chunking,
            batch_size: self.batch_size,
        })
    }
}

fn require<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::config(format!(
            "{name} is not set; export it or add it to .env"
        ))),
    }
}
