use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cv_rag::config::{ChatArgs, EmbeddingArgs, PineconeArgs};
use cv_rag::env_check::load_env_file;
use cv_rag::store::DEFAULT_UPSERT_BATCH;
use cv_rag::{logging, Assistant, ChatSession, ProfileMetadata};

const EXIT_COMMANDS: &[&str] = &["/salir", "/exit", "/quit"];

#[derive(Parser, Debug)]
#[command(
    name = "cv-chat",
    about = "Ask questions about the indexed résumé from the terminal"
)]
struct ChatCli {
    /// Profile metadata JSON merged into every prompt
    #[arg(long, env = "CV_METADATA_PATH", default_value = "docs/metadata.json")]
    metadata: PathBuf,

    /// Answer a single question and exit
    #[arg(long)]
    question: Option<String>,

    /// Print the rendered prompt instead of the model's answer
    #[arg(long, default_value_t = false)]
    show_prompt: bool,

    #[command(flatten)]
    pinecone: PineconeArgs,

    #[command(flatten)]
    chat: ChatArgs,

    #[command(flatten)]
    embedding: EmbeddingArgs,
}

fn main() -> Result<()> {
    logging::init();
    load_env_file(&[PathBuf::from(".env")]);
    let cli = ChatCli::parse();

    let today = Local::now().date_naive();
    let metadata = ProfileMetadata::load(&cli.metadata, today)
        .with_context(|| format!("failed to load {}", cli.metadata.display()))?;
    let options = cli.chat.answer_options()?;
    let llm = cli.chat.connect()?;
    let client = cli.pinecone.connect(DEFAULT_UPSERT_BATCH)?;
    let index = client
        .index(&cli.pinecone.index)
        .with_context(|| format!("failed to open index '{}'", cli.pinecone.index))?;
    let embedder = cli
        .embedding
        .load()
        .context("failed to load the embedding model")?;

    let assistant = Assistant::new(embedder.as_ref(), &index, &llm, &metadata, options);
    if let Some(question) = cli.question.as_deref() {
        if cli.show_prompt {
            println!("{}", assistant.prompt_for(question)?);
        } else {
            println!("{}", assistant.answer(question));
        }
        return Ok(());
    }
    repl(&assistant, cli.show_prompt)
}

fn repl(assistant: &Assistant<'_>, show_prompt: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session = ChatSession::new();
    println!("Asistente de CV. Escribí tu pregunta ({} para terminar).", EXIT_COMMANDS[0]);

    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if EXIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
            break;
        }

        session.set_input(line)?;
        let Some(question) = session.submit()? else {
            continue;
        };
        let answer = assistant.answer_with(&question, |prompt| {
            if show_prompt {
                println!("--- Prompt ---\n{prompt}");
            }
        });
        session.record_answer(answer)?;
        if let Some(answer) = session.last_answer() {
            println!("\n{answer}\n");
        }
        session.acknowledge()?;
    }
    tracing::debug!("session ended after {} turns", session.history().len());
    Ok(())
}
