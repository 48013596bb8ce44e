//! Offline ingestion: PDF → chunks → embeddings → vector index.

use std::path::Path;

use crate::chunker::{Chunk, ChunkConfig, Chunker};
use crate::embed::Embedder;
use crate::loader::load_pdf;
use crate::store::{IndexProvisioner, IndexStatus, IndexTarget, VectorIndex, VectorRecord};
use crate::{Error, Result};

/// Tunables for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Window geometry.
    pub chunking: ChunkConfig,
    /// Chunks embedded and upserted together.
    pub batch_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkConfig::default(),
            batch_size: crate::store::DEFAULT_UPSERT_BATCH,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks produced from the source text.
    pub chunks: usize,
    /// Records acknowledged by the index.
    pub upserted: usize,
    /// Whether the index existed before the run.
    pub index_status: Option<IndexStatus>,
}

/// Chunks `text`, embeds it in batches and upserts every batch.
pub fn ingest_text(
    text: &str,
    options: &IngestOptions,
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
) -> Result<IngestReport> {
    if options.batch_size == 0 {
        return Err(Error::config("batch size must be greater than zero"));
    }
    let chunker = Chunker::new(options.chunking.clone())?;
    let chunks: Vec<Chunk> = chunker.chunks(text).collect();
    let total = chunks.len();
    tracing::info!("split text into {total} chunks");

    let mut upserted = 0usize;
    for batch in chunks.chunks(options.batch_size) {
        let texts: Vec<&str> = batch.iter().map(|chunk| chunk.text.as_str()).collect();
        let vectors = embedder.embed_many(&texts)?;
        if vectors.len() != batch.len() {
            return Err(Error::Provider(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            )));
        }
        let records: Vec<VectorRecord> = batch
            .iter()
            .zip(vectors)
            .map(|(chunk, values)| {
                VectorRecord::for_chunk(&chunk.id, values, &chunk.text, &chunk.section)
            })
            .collect();
        upserted += index.upsert(&records)?;
        tracing::info!("  -> {upserted}/{total} chunks uploaded");
    }

    Ok(IngestReport {
        chunks: total,
        upserted,
        index_status: None,
    })
}

/// Full ingestion of the PDF at `pdf` into `target`.
///
/// `open_index` turns the ensured index name into a data-plane handle.
pub fn ingest_pdf<P, I, F>(
    pdf: &Path,
    target: &IndexTarget,
    options: &IngestOptions,
    embedder: &dyn Embedder,
    provisioner: &P,
    open_index: F,
) -> Result<IngestReport>
where
    P: IndexProvisioner + ?Sized,
    I: VectorIndex,
    F: FnOnce(&str) -> Result<I>,
{
    options.chunking.validate()?;
    let text = load_pdf(pdf)?;
    ingest_document(&text, target, options, embedder, provisioner, open_index)
}

/// Ingests already extracted text: ensures the index, then chunks, embeds
/// and upserts.
pub fn ingest_document<P, I, F>(
    text: &str,
    target: &IndexTarget,
    options: &IngestOptions,
    embedder: &dyn Embedder,
    provisioner: &P,
    open_index: F,
) -> Result<IngestReport>
where
    P: IndexProvisioner + ?Sized,
    I: VectorIndex,
    F: FnOnce(&str) -> Result<I>,
{
    let index_name = target.name.as_str();
    let status = provisioner.ensure_index(&target.spec(embedder.dimension()))?;
    let index = open_index(index_name)?;

    tracing::info!("starting ingestion into '{index_name}'");
    let mut report = ingest_text(text, options, embedder, &index)?;
    report.index_status = Some(status);

    match index.stats() {
        Ok(stats) => tracing::info!(
            "index '{index_name}' now holds {} vectors ({} dims)",
            stats.total_vector_count,
            stats.dimension
        ),
        Err(err) => tracing::warn!("could not read index stats: {err}"),
    }
    Ok(report)
}
