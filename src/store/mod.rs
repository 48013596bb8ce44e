//! Vector index clients.
//!
//! Provisioning (creating an index) and data-plane access (upsert, query) are
//! separate traits: the ingestion run needs both, the chat loop only the
//! second.

use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub mod memory;
pub mod pinecone;

pub use memory::MemoryStore;
pub use pinecone::{PineconeClient, PineconeIndex};

/// Metadata field holding the chunk text.
pub const TEXT_FIELD: &str = "texto";
/// Metadata field holding the section tag.
pub const SECTION_FIELD: &str = "seccion";
/// Records sent per upsert request.
pub const DEFAULT_UPSERT_BATCH: usize = 64;

/// Similarity metric of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity.
    Cosine,
    /// Euclidean distance.
    Euclidean,
    /// Dot product.
    Dotproduct,
}

/// Everything needed to create a serverless index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Vector dimension; must equal the embedder's.
    pub dimension: usize,
    /// Similarity metric.
    pub metric: Metric,
    /// Cloud provider hosting the index.
    pub cloud: String,
    /// Cloud region.
    pub region: String,
}

impl IndexSpec {
    /// Cosine index in the given cloud/region.
    pub fn cosine(
        name: impl Into<String>,
        dimension: usize,
        cloud: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: Metric::Cosine,
            cloud: cloud.into(),
            region: region.into(),
        }
    }
}

/// Name and placement of the index an ingestion run writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    /// Index name.
    pub name: String,
    /// Cloud provider.
    pub cloud: String,
    /// Cloud region.
    pub region: String,
}

impl IndexTarget {
    /// Cosine spec for vectors of `dimension`.
    pub fn spec(&self, dimension: usize) -> IndexSpec {
        IndexSpec::cosine(&self.name, dimension, &self.cloud, &self.region)
    }
}

/// Outcome of [`IndexProvisioner::ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index was already reachable.
    Existing,
    /// The index was created by this call.
    Created,
}

/// One stored vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Record id; upserting an existing id overwrites it.
    pub id: String,
    /// Vector values.
    pub values: Vec<f32>,
    /// Arbitrary metadata stored alongside the vector.
    pub metadata: Map<String, Value>,
}

impl VectorRecord {
    /// Record for a text chunk with the standard metadata fields.
    pub fn for_chunk(id: &str, values: Vec<f32>, text: &str, section: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert(TEXT_FIELD.to_string(), Value::String(text.to_string()));
        metadata.insert(SECTION_FIELD.to_string(), Value::String(section.to_string()));
        Self {
            id: id.to_string(),
            values,
            metadata,
        }
    }
}

/// One nearest-neighbour hit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryMatch {
    /// Record id.
    pub id: String,
    /// Similarity score; higher is closer.
    pub score: f32,
    /// Stored metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl QueryMatch {
    /// Stored chunk text, or an empty string when the record has none.
    pub fn text(&self) -> &str {
        self.metadata
            .get(TEXT_FIELD)
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Summary counters for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Vector dimension.
    pub dimension: usize,
    /// Number of stored vectors.
    pub total_vector_count: u64,
}

/// Creates indexes on demand.
pub trait IndexProvisioner {
    /// Makes sure the index exists and is ready. Idempotent.
    fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus>;
}

/// Data-plane access to one index.
pub trait VectorIndex {
    /// Inserts or overwrites records by id; returns how many were written.
    fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;

    /// Up to `top_k` matches, best first. No matches is not an error.
    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>>;

    /// Index counters.
    fn stats(&self) -> Result<IndexStats>;
}

impl<T: VectorIndex + ?Sized> VectorIndex for &T {
    fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        (**self).upsert(records)
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        (**self).query(vector, top_k)
    }

    fn stats(&self) -> Result<IndexStats> {
        (**self).stats()
    }
}

/// Fixed-interval polling with an overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionPolicy {
    /// Pause between readiness probes.
    pub poll_interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl Default for ProvisionPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ProvisionPolicy {
    /// Calls `probe` until it reports ready or the deadline passes.
    ///
    /// Retryable probe errors count as "not ready yet"; any other error
    /// (bad credentials, malformed response) is returned at once.
    pub fn wait_until_ready<F>(&self, name: &str, mut probe: F) -> Result<()>
    where
        F: FnMut() -> Result<bool>,
    {
        let started = Instant::now();
        let mut last_error = None;
        loop {
            match probe() {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) if err.is_retryable() => {
                    tracing::warn!("index '{name}' not reachable yet: {err}");
                    last_error = Some(err.to_string());
                }
                Err(err) => return Err(err),
            }
            if started.elapsed() >= self.timeout {
                let cause = last_error
                    .map(|err| format!(" (last error: {err})"))
                    .unwrap_or_default();
                return Err(Error::Provisioning(format!(
                    "index '{name}' was not ready after {:?}{cause}",
                    self.timeout
                )));
            }
            thread::sleep(self.poll_interval);
        }
    }
}

pub(crate) fn check_dimension(expected: usize, records: &[VectorRecord]) -> Result<()> {
    if let Some(bad) = records.iter().find(|r| r.values.len() != expected) {
        return Err(Error::config(format!(
            "record '{}' has {} dimensions but the index expects {expected}",
            bad.id,
            bad.values.len()
        )));
    }
    Ok(())
}
