//! In-process vector index for tests and dry runs.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::store::{
    check_dimension, IndexProvisioner, IndexSpec, IndexStats, IndexStatus, QueryMatch,
    VectorIndex, VectorRecord,
};
use crate::{Error, Result};

/// Brute-force cosine store holding a single index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    spec: Option<IndexSpec>,
    creations: usize,
    records: HashMap<String, VectorRecord>,
}

impl MemoryStore {
    /// Empty store with no index.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times an index was actually created.
    pub fn creations(&self) -> usize {
        self.read().map(|state| state.creations).unwrap_or(0)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.read().map(|state| state.records.len()).unwrap_or(0)
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored record by id.
    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        self.read().ok()?.records.get(id).cloned()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::Provider("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::Provider("memory store lock poisoned".to_string()))
    }
}

impl IndexProvisioner for MemoryStore {
    fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        let mut state = self.write()?;
        if let Some(existing) = &state.spec {
            if existing.name == spec.name {
                if existing.dimension != spec.dimension {
                    return Err(Error::config(format!(
                        "index '{}' has dimension {} but the embedder produces {}",
                        spec.name, existing.dimension, spec.dimension
                    )));
                }
                tracing::info!("index '{}' already exists", spec.name);
                return Ok(IndexStatus::Existing);
            }
            state.records.clear();
        }
        state.spec = Some(spec.clone());
        state.creations += 1;
        tracing::info!("created index '{}'", spec.name);
        Ok(IndexStatus::Created)
    }
}

impl VectorIndex for MemoryStore {
    fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut state = self.write()?;
        if let Some(spec) = &state.spec {
            check_dimension(spec.dimension, records)?;
        }
        for record in records {
            state.records.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let state = self.read()?;
        let mut matches: Vec<QueryMatch> = state
            .records
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.values),
                metadata: record.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }

    fn stats(&self) -> Result<IndexStats> {
        let state = self.read()?;
        Ok(IndexStats {
            dimension: state.spec.as_ref().map(|s| s.dimension).unwrap_or(0),
            total_vector_count: state.records.len() as u64,
        })
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
