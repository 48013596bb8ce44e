use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cv_rag::config::{ChunkArgs, EmbeddingArgs, PineconeArgs};
use cv_rag::env_check::load_env_file;
use cv_rag::loader::load_pdf;
use cv_rag::store::IndexStatus;
use cv_rag::{ingest_document, logging};

#[derive(Parser, Debug)]
#[command(
    name = "cv-ingest",
    about = "Chunk a résumé PDF, embed it and upsert it into the vector index"
)]
struct IngestCli {
    /// Path to the résumé PDF
    #[arg(default_value = "docs/cv.pdf")]
    pdf: PathBuf,

    #[command(flatten)]
    pinecone: PineconeArgs,

    #[command(flatten)]
    embedding: EmbeddingArgs,

    #[command(flatten)]
    chunks: ChunkArgs,
}

fn main() -> Result<()> {
    logging::init();
    load_env_file(&[PathBuf::from(".env")]);
    let cli = IngestCli::parse();

    if !cli.pdf.is_file() {
        bail!("PDF not found at {}", cli.pdf.display());
    }
    let options = cli.chunks.options()?;
    let client = cli
        .pinecone
        .connect(options.batch_size)
        .context("failed to configure the vector store client")?;
    let target = cli.pinecone.target();
    let text = load_pdf(&cli.pdf)
        .with_context(|| format!("failed to extract text from {}", cli.pdf.display()))?;

    tracing::info!("loading embedding model");
    let embedder = cli
        .embedding
        .load()
        .context("failed to load the embedding model")?;
    tracing::info!(
        "embedding with {} ({} dims)",
        embedder.model_name(),
        embedder.dimension()
    );

    let report = ingest_document(
        &text,
        &target,
        &options,
        embedder.as_ref(),
        &client,
        |name| client.index(name),
    )
    .with_context(|| format!("ingestion of {} failed", cli.pdf.display()))?;

    let created = matches!(report.index_status, Some(IndexStatus::Created));
    println!(
        "ingested {} chunks into '{}'{}",
        report.upserted,
        target.name,
        if created { " (index created)" } else { "" }
    );
    Ok(())
}
