//! Local `all-MiniLM-L6-v2` embeddings through fastembed (ONNX runtime).

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// Hugging Face identifier of the bundled model.
pub const MINILM_MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Sentence-transformers MiniLM running in-process.
///
/// The ONNX weights are downloaded on first use and cached on disk. The
/// session needs exclusive access during inference, hence the mutex.
pub struct MiniLmEmbedder {
    model: Mutex<TextEmbedding>,
    dimension: usize,
}

impl MiniLmEmbedder {
    /// Loads the model into memory and probes its output dimension.
    pub fn load(cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(true);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }
        let model = TextEmbedding::try_new(options)
            .map_err(|err| Error::Provider(format!("failed to load {MINILM_MODEL_NAME}: {err}")))?;

        let mut embedder = Self {
            model: Mutex::new(model),
            dimension: 0,
        };
        embedder.dimension = embedder.embed_one("dimension probe")?.len();
        tracing::info!(
            "loaded embedding model {MINILM_MODEL_NAME} ({} dimensions)",
            embedder.dimension
        );
        Ok(embedder)
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed_one(&self, text: &str) -> Result<Embedding> {
        self.embed_many(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("model returned no embeddings".to_string()))
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::Provider("embedding model lock poisoned".to_string()))?;
        let embeddings = model
            .embed(texts.to_vec(), None)
            .map_err(|err| Error::Provider(format!("embedding failed: {err}")))?;
        if embeddings.len() != texts.len() {
            return Err(Error::Provider(format!(
                "model returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        MINILM_MODEL_NAME
    }
}
