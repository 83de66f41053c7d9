//! # docsum CLI
//!
//! The `docsum` binary serves the summarization API and exposes the same
//! pipeline for one-off use from the shell.
//!
//! ## Usage
//!
//! ```bash
//! docsum [--config ./docsum.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsum serve` | Load the model once and start the HTTP server |
//! | `docsum summarize <FILE>` | Summarize a document and print `{summary, stats}` JSON |
//! | `docsum extract <FILE>` | Print the text extracted from a document |
//! | `docsum download <SUMMARY>` | Write a summary into `summary.docx` |
//!
//! ## Examples
//!
//! ```bash
//! # Serve with the bundled local model
//! docsum serve
//!
//! # Short summary of a PDF, using Ollama
//! docsum --config ./docsum.toml summarize report.pdf --length short
//!
//! # See what the extractor reads from a Word file
//! docsum extract notes.docx
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use docsum::config::{self, Config};
use docsum::download::{build_summary_docx, SUMMARY_FILENAME};
use docsum::extract::extract_text;
use docsum::logging;
use docsum::models::{DocumentFormat, LengthTier, SourceDocument};
use docsum::pipeline::{Pipeline, PipelineError, PipelineOutcome};
use docsum::server;
use docsum::summarizer::create_summarizer;

/// docsum: extract, summarize, and package documents.
#[derive(Parser)]
#[command(
    name = "docsum",
    about = "Document summarizer: extract text from txt/docx/pdf and summarize it",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional; every setting has a default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Loads the summarization model once (downloading it on first run) and
    /// serves `/summarize` and `/download` on `[server].bind`.
    Serve,

    /// Summarize a document and print the result as JSON.
    ///
    /// Prints `{summary, stats}` on success. On failure prints `{error}` and
    /// exits with status 1.
    Summarize {
        /// Document to summarize (.txt, .docx or .pdf).
        file: PathBuf,

        /// Summary length: `short`, `medium` or `detailed`.
        #[arg(long, default_value = "medium")]
        length: String,
    },

    /// Print the text extracted from a document.
    ///
    /// Needs no model; useful for checking what the summarizer will read.
    Extract {
        /// Document to read (.txt, .docx or .pdf).
        file: PathBuf,
    },

    /// Write a summary into a Word document.
    Download {
        /// Summary text.
        summary: String,

        /// Output path.
        #[arg(long, default_value = SUMMARY_FILENAME)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Serve => {
            let summarizer = create_summarizer(&cfg.summarizer).await?;
            server::run_server(&cfg, summarizer).await?;
        }
        Commands::Summarize { file, length } => {
            run_summarize(&cfg, &file, &length).await?;
        }
        Commands::Extract { file } => {
            run_extract(&file)?;
        }
        Commands::Download { summary, output } => {
            let bytes = build_summary_docx(&summary)?;
            std::fs::write(&output, bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

async fn run_summarize(cfg: &Config, file: &Path, length: &str) -> anyhow::Result<()> {
    // Unsupported names are rejected before the model is loaded or fetched.
    let outcome = match DocumentFormat::from_filename(&file_name(file)) {
        Err(e) => PipelineOutcome::from(Err(PipelineError::from(e))),
        Ok(format) => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let summarizer = create_summarizer(&cfg.summarizer).await?;
            let pipeline = Pipeline::new(summarizer);
            pipeline
                .run(SourceDocument::new(bytes, format), LengthTier::from_label(length))
                .await
                .into()
        }
    };
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let PipelineOutcome::Failure { .. } = outcome {
        std::process::exit(1);
    }
    Ok(())
}

fn run_extract(file: &Path) -> anyhow::Result<()> {
    let format = DocumentFormat::from_filename(&file_name(file))?;
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let text = extract_text(&bytes, format)?;
    println!("{}", text);
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
