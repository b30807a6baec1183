use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use docqa_core::{
    load_document, Answer, AnswerGenerator, CharacterNgramEmbedder, ChunkStrategy, Embedder,
    HuggingFaceConfig, HuggingFaceEmbedder, HuggingFaceGenerator, IngestionOptions, QaSession,
    RetrievalOptions, SessionError, SessionState, DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];
const RESET_COMMAND: &str = ":reset";
const LOAD_COMMAND: &str = ":load ";

#[derive(Parser)]
#[command(name = "docqa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    provider: ProviderArgs,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args)]
struct ProviderArgs {
    /// Hugging Face API token
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Hugging Face Inference API base URL
    #[arg(long, env = "DOCQA_HF_BASE_URL", default_value = docqa_core::providers::huggingface::DEFAULT_BASE_URL)]
    hf_base_url: String,

    /// Embedding backend
    #[arg(long, value_enum, env = "DOCQA_EMBEDDER", default_value_t = EmbedderKind::HuggingFace)]
    embedder: EmbedderKind,

    /// Feature-extraction model
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL", default_value = docqa_core::providers::huggingface::DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Dimension produced by the embedding model
    #[arg(long, env = "DOCQA_EMBEDDING_DIMENSIONS", default_value_t = docqa_core::providers::huggingface::DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Text-generation model
    #[arg(long, env = "DOCQA_GENERATION_MODEL", default_value = docqa_core::providers::huggingface::DEFAULT_GENERATION_MODEL)]
    generation_model: String,

    /// Per-request timeout in seconds, also used as the deadline for ingest and ask
    #[arg(long, env = "DOCQA_TIMEOUT_SECS", default_value = "60")]
    timeout_secs: u64,
}

#[derive(Args)]
struct PipelineArgs {
    /// Chunk size in characters
    #[arg(long, env = "DOCQA_CHUNK_SIZE", default_value_t = docqa_core::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// How the document is split into chunks
    #[arg(long, value_enum, env = "DOCQA_CHUNK_STRATEGY", default_value_t = StrategyArg::Fixed)]
    chunk_strategy: StrategyArg,

    /// Number of chunks retrieved per question
    #[arg(long, env = "DOCQA_TOP_K", default_value_t = docqa_core::DEFAULT_TOP_K)]
    top_k: usize,

    /// Write the `{id, text, vector}` records of the indexed document as JSON
    #[arg(long)]
    dump_index: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmbedderKind {
    /// Hugging Face feature-extraction pipeline.
    #[value(name = "huggingface")]
    HuggingFace,
    /// Local character trigram hashing, no network.
    Ngram,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Fixed,
    Sentences,
}

impl From<StrategyArg> for ChunkStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Fixed => ChunkStrategy::FixedWindow,
            StrategyArg::Sentences => ChunkStrategy::Sentences,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Load a document and answer questions from stdin until `exit`.
    Chat {
        /// PDF or plain-text document.
        #[arg(long)]
        document: PathBuf,
    },
    /// Answer a single question about a document.
    Ask {
        /// PDF or plain-text document.
        #[arg(long)]
        document: PathBuf,
        /// Question to answer.
        #[arg(long)]
        question: String,
    },
}

fn build_session(cli: &Cli) -> anyhow::Result<QaSession> {
    let provider = &cli.provider;
    let config = HuggingFaceConfig {
        api_token: provider.hf_token.clone(),
        base_url: provider.hf_base_url.clone(),
        embedding_model: provider.embedding_model.clone(),
        embedding_dimensions: provider.embedding_dimensions,
        generation_model: provider.generation_model.clone(),
        timeout: Duration::from_secs(provider.timeout_secs),
    };

    let embedder: Arc<dyn Embedder> = match provider.embedder {
        EmbedderKind::HuggingFace => Arc::new(HuggingFaceEmbedder::new(config.clone())?),
        EmbedderKind::Ngram => Arc::new(CharacterNgramEmbedder {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }),
    };
    let generator: Arc<dyn AnswerGenerator> = Arc::new(HuggingFaceGenerator::new(config)?);

    Ok(QaSession::new(embedder, generator)
        .with_ingestion_options(IngestionOptions {
            chunk_size: cli.pipeline.chunk_size,
            strategy: cli.pipeline.chunk_strategy.into(),
        })
        .with_retrieval_options(RetrievalOptions {
            top_k: cli.pipeline.top_k,
        }))
}

async fn ingest_path(
    session: &mut QaSession,
    path: &Path,
    deadline: Duration,
    dump_index: Option<&Path>,
) -> anyhow::Result<()> {
    let document = load_document(path).await?;
    let state = session.ingest_with_deadline(document, deadline).await?;

    match state {
        SessionState::Indexed { chunks: 0 } => {
            warn!(path = %path.display(), "document has no answerable content")
        }
        SessionState::Indexed { chunks } => {
            info!(path = %path.display(), chunks, "document ready")
        }
        SessionState::Empty => {}
    }

    if let Some(target) = dump_index {
        let records = session.records();
        tokio::fs::write(target, serde_json::to_vec_pretty(&records)?).await?;
        info!(path = %target.display(), records = records.len(), "index records written");
    }

    Ok(())
}

fn print_answer(answer: &Answer) {
    match answer {
        Answer::NoContext => println!("\n{answer}"),
        Answer::Generated { chunk_ids, .. } => {
            info!(?chunk_ids, "answer generated");
            println!("\nAnswer: {answer}");
        }
    }
}

/// Generation and embedding failures are shown and the loop continues;
/// anything else ends the command.
fn report_ask_error(error: SessionError) -> anyhow::Result<()> {
    if error.is_recoverable() {
        println!("\nError: {error}");
        Ok(())
    } else {
        Err(error.into())
    }
}

async fn chat(
    mut session: QaSession,
    document: &Path,
    deadline: Duration,
    dump_index: Option<&Path>,
) -> anyhow::Result<()> {
    ingest_path(&mut session, document, deadline, dump_index).await?;
    println!("Ready. Ask questions about the document (type 'exit' to quit).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYour Question: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            info!("exiting chat");
            break;
        }
        if question == RESET_COMMAND {
            session.reset();
            println!("Session cleared. Use `:load <path>` to open a document.");
            continue;
        }
        if let Some(path) = question.strip_prefix(LOAD_COMMAND) {
            let loaded =
                ingest_path(&mut session, Path::new(path.trim()), deadline, dump_index).await;
            if let Err(error) = loaded {
                println!("\nError: {error}");
            }
            continue;
        }

        match session.ask_with_deadline(question, deadline).await {
            Ok(answer) => print_answer(&answer),
            Err(SessionError::NotIndexed) => {
                println!("No document loaded. Use `:load <path>` first.")
            }
            Err(error) => report_ask_error(error)?,
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let session = build_session(&cli)?;
    let deadline = Duration::from_secs(cli.provider.timeout_secs);
    let dump_index = cli.pipeline.dump_index.as_deref();

    info!(
        version = app_version,
        session = %session.id(),
        started_at = %Utc::now().to_rfc3339(),
        "docqa boot"
    );

    match &cli.command {
        Command::Chat { document } => chat(session, document, deadline, dump_index).await?,
        Command::Ask { document, question } => {
            let mut session = session;
            ingest_path(&mut session, document, deadline, dump_index).await?;
            match session.ask_with_deadline(question, deadline).await {
                Ok(answer) => print_answer(&answer),
                Err(error) => return Err(error.into()),
            }
        }
    }

    Ok(())
}
