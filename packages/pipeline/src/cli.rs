//! Command-line interface for the annotation pipeline.

use std::path::{Path, PathBuf};

use annotext_splicer::{extract_document, Session};
use clap::{Parser, Subcommand};
use console::style;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::annotation::{EntityAnnotator, HttpNerClient};
use crate::config::{DirectoryConfig, NerConfig, WorkerConfig};
use crate::error::{PipelineError, Result};
use crate::processor::DocumentProcessor;
use crate::store::{DirectoryStore, Pager, StoredDocument};
use crate::worker::{run_batch, run_enrich_worker, spawn_signal_listener, ErrorPolicy, RunSummary};

const DEFAULT_FIELD: &str = "sma_data_json";

/// Annotext - inline named-entity annotation of nested documents.
#[derive(Parser)]
#[command(name = "annotext")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate the configured Elasticsearch index (configured via environment).
    Run {
        /// Offset of the first document, to resume an earlier run
        #[arg(long)]
        start_offset: Option<usize>,

        /// What to do when a document fails: continue or abort
        #[arg(long)]
        on_error: Option<ErrorPolicy>,
    },

    /// Annotate a local JSON file or every JSON file of a directory.
    Annotate {
        /// JSON file or directory of JSON files
        input: PathBuf,

        /// Directory to write annotated documents to
        #[arg(short, long)]
        output: PathBuf,

        /// Field holding the tree to annotate
        #[arg(short, long, default_value = DEFAULT_FIELD)]
        field: String,

        /// NER service URL (default: $NER_API_URL)
        #[arg(long)]
        ner_url: Option<String>,

        /// Entity label to mark up
        #[arg(long, default_value = "ORG")]
        label: String,

        /// What to do when a document fails: continue or abort
        #[arg(long, default_value_t = ErrorPolicy::Continue)]
        on_error: ErrorPolicy,
    },

    /// Show the skeleton and prose fragments of a local JSON file.
    Extract {
        /// JSON file to inspect
        file: PathBuf,

        /// Field holding the tree; use "." for the whole document
        #[arg(short, long, default_value = DEFAULT_FIELD)]
        field: String,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            start_offset,
            on_error,
        } => run_command(start_offset, on_error).await,
        Commands::Annotate {
            input,
            output,
            field,
            ner_url,
            label,
            on_error,
        } => {
            let ner = ner_config(ner_url, label)?;
            let mut directories = DirectoryConfig::new(input, output);
            directories.document_field = field;
            annotate_command(&ner, &directories, on_error).await
        }
        Commands::Extract { file, field } => extract_command(&file, &field).await,
    }
}

fn ner_config(ner_url: Option<String>, label: String) -> Result<NerConfig> {
    let mut config = match ner_url {
        Some(url) => NerConfig::builder(url).build(),
        None => NerConfig::from_env()?,
    };
    config.entity_label = label;
    Ok(config)
}

async fn run_command(start_offset: Option<usize>, on_error: Option<ErrorPolicy>) -> Result<()> {
    let mut config = WorkerConfig::from_env()?;
    if let Some(offset) = start_offset {
        config.start_offset = offset;
    }
    if let Some(policy) = on_error {
        config.error_policy = policy;
    }

    println!(
        "{} {} {} {}",
        style("Annotating").bold(),
        style(&config.store.source_index).cyan(),
        style("into").bold(),
        style(&config.store.dest_index).cyan()
    );

    let summary = run_enrich_worker(config).await?;
    print_summary(&summary);
    Ok(())
}

async fn annotate_command(
    ner: &NerConfig,
    directories: &DirectoryConfig,
    policy: ErrorPolicy,
) -> Result<()> {
    let input = &directories.input_dir;
    let client = HttpNerClient::new(ner)?;
    let annotator = EntityAnnotator::new(client, ner);

    if input.is_dir() {
        let store = DirectoryStore::new(input, &directories.output_dir);
        let processor = DocumentProcessor::new(annotator, store, directories.document_field.clone());

        let shutdown = CancellationToken::new();
        spawn_signal_listener(shutdown.clone())?;

        let summary = run_batch(&processor, Pager::new(0, 50), policy, &shutdown).await?;
        print_summary(&summary);
        return Ok(());
    }

    let document = read_document(input).await?;
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let store = DirectoryStore::new(parent, &directories.output_dir);
    let processor = DocumentProcessor::new(annotator, store, directories.document_field.clone());

    let report = processor.process(&document).await?;
    println!(
        "{} {} ({} fragments)",
        style("Annotated").green().bold(),
        document.id,
        report.fragments
    );
    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        directories
            .output_dir
            .join(format!("{}.json", document.id))
            .display()
    );
    Ok(())
}

async fn extract_command(file: &Path, field: &str) -> Result<()> {
    let document = read_document(file).await?;
    let tree = select_field(document.source, field);

    let mut session = Session::new();
    let skeleton = extract_document(tree, &mut session)?;

    println!("{}", style("Skeleton").bold());
    println!("{}", serde_json::to_string_pretty(&skeleton)?);
    println!();
    println!(
        "{} {}",
        style("Fragments:").bold(),
        style(session.fragments().len()).cyan()
    );
    for (placeholder, fragment) in session.placeholders().iter().zip(session.fragments()) {
        println!("  {} {}", style(placeholder).dim(), fragment);
    }
    Ok(())
}

fn select_field(source: Value, field: &str) -> Value {
    if field == "." {
        return source;
    }
    match source {
        Value::Object(mut map) => map.remove(field).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

async fn read_document(path: &Path) -> Result<StoredDocument> {
    if !path.is_file() {
        return Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", path.display()),
        )));
    }

    let raw = tokio::fs::read_to_string(path).await?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
        .ok_or_else(|| PipelineError::MissingDocumentId(path.display().to_string()))?;

    Ok(StoredDocument {
        id,
        source: serde_json::from_str(&raw)?,
    })
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "{} {} processed, {} failed",
        style("Done:").green().bold(),
        summary.processed,
        if summary.failed > 0 {
            style(summary.failed).red().bold()
        } else {
            style(summary.failed)
        }
    );
    println!("  Resume offset: {}", summary.next_offset);
}
