//! # SOP Assist CLI (`sopa`)
//!
//! The `sopa` binary answers questions about a controlled library of SOP
//! PDF documents, grounded in the pages it retrieves and cited page by
//! page.
//!
//! ## Usage
//!
//! ```bash
//! sopa --config ./sopa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sopa status` | Scan the corpus and report what would be indexed |
//! | `sopa ask "<question>"` | Answer one question and print its citations |
//! | `sopa chat` | Interactive session with an exportable audit log |
//!
//! API keys are read from the environment variables named in the config
//! file; a `.env` file next to the working directory is loaded if present.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sop_assist::{chat, config, status};

/// SOP Assist — retrieval-grounded question answering over a controlled
/// SOP document library.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `sopa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "sopa",
    about = "SOP Assist — retrieval-grounded question answering over a controlled SOP library",
    version,
    long_about = "SOP Assist ingests every page of every PDF in a corpus directory, builds an \
    in-memory vector index once per process, and answers questions by retrieving the nearest \
    pages and invoking a hosted chat model at temperature zero. Every answer cites every page \
    consulted, and every completed turn is recorded in a CSV-exportable audit log."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./sopa.toml`. The corpus directory, embedding backend,
    /// chat model, and retrieval settings are read from this file.
    #[arg(long, global = true, default_value = "./sopa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scan the corpus and report what would be indexed.
    ///
    /// Lists every readable document with its page count and SHA-256
    /// fingerprint, names any skipped files, and states whether the
    /// assistant is available. Requires no credentials and performs no
    /// network calls.
    Status,

    /// Answer one question and exit.
    ///
    /// Builds the index, runs a single turn, and prints the answer
    /// followed by every source page consulted. Fails with a visible
    /// message when the corpus holds no readable documents.
    Ask {
        /// The question to answer.
        question: String,

        /// Override the configured number of pages to retrieve.
        #[arg(long)]
        top_k: Option<usize>,

        /// Write the single-entry audit log as CSV to this path.
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Start an interactive question-answering session.
    ///
    /// Reads one question per line at the `sop>` prompt. Meta-commands:
    /// `/help`, `/sources`, `/log`, `/export [PATH]`, `/quit`.
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Status => {
            status::run_status(&cfg)?;
        }
        Commands::Ask {
            question,
            top_k,
            audit,
        } => {
            chat::run_ask(&cfg, &question, top_k, audit.as_deref()).await?;
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
    }

    Ok(())
}
