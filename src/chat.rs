//! Interactive surfaces: the one-shot `ask` command and the `chat` loop.
//!
//! Both surfaces share the same bootstrap path: build the embedder and
//! chat client from config, build the engine once, and refuse to serve
//! any query when the corpus is unavailable. The chat loop reads one
//! line at a time from stdin; turns run strictly one after another.

use anyhow::{bail, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;

use crate::audit::Session;
use crate::config::Config;
use crate::embedder::create_embedder;
use crate::engine::{Engine, EngineStartup, TurnReport};
use crate::llm::ChatClient;
use crate::models::QueryMode;

async fn bootstrap_engine(config: &Config) -> Result<Engine> {
    let embedder = create_embedder(&config.embedding)?;
    let chat = ChatClient::new(&config.model)?;

    match Engine::bootstrap(config, embedder, chat).await? {
        EngineStartup::Ready(engine) => Ok(engine),
        EngineStartup::Unavailable { reason } => {
            bail!("assistant unavailable: {}", reason)
        }
    }
}

fn print_report(report: &TurnReport) {
    println!("{}", report.answer);
    println!();
    match report.mode {
        QueryMode::Content => {
            println!("Sources consulted:");
            for citation in &report.citations {
                println!("  - {}", citation);
            }
        }
        QueryMode::Metadata => {
            println!("Sources consulted: (none — answered from the document catalog)");
        }
    }
}

/// Run a single question-answer turn and optionally export its audit row.
pub async fn run_ask(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    audit_path: Option<&Path>,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(k) = top_k {
        if k == 0 {
            bail!("--top-k must be >= 1");
        }
        config.retrieval.top_k = k;
    }

    let engine = bootstrap_engine(&config).await?;
    let mut session = Session::new();

    let report = engine.run_turn(&mut session, question).await?;
    print_report(&report);

    if let Some(path) = audit_path {
        session.log.export_csv(path)?;
        println!();
        println!("Audit log written to {}", path.display());
    }

    Ok(())
}

/// Run the interactive chat loop until `/quit` or EOF.
pub async fn run_chat(config: &Config) -> Result<()> {
    let engine = bootstrap_engine(config).await?;
    let mut session = Session::new();

    println!("SOP Assist — session {}", session.id);
    println!(
        "{} documents, {} pages indexed. Type /help for commands.",
        engine.docs().len(),
        engine.page_count()
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("sop> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if handle_command(command, &engine, &session, &config.audit.export_dir)? {
                break;
            }
            continue;
        }

        match engine.run_turn(&mut session, line).await {
            Ok(report) => {
                println!();
                print_report(&report);
                println!();
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    println!(
        "Session ended. {} turn{} logged.",
        session.log.len(),
        if session.log.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Handle one `/command` line. Returns true when the loop should exit.
fn handle_command(
    command: &str,
    engine: &Engine,
    session: &Session,
    export_dir: &Path,
) -> Result<bool> {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or("") {
        "help" => {
            println!("Commands:");
            println!("  /sources         list indexed documents");
            println!("  /log             show this session's audit log");
            println!("  /export [PATH]   write the audit log as CSV");
            println!("  /quit            end the session");
        }
        "sources" => {
            for doc in engine.docs() {
                println!("  {} ({} pages)", doc.name, doc.pages);
            }
        }
        "log" => {
            if session.log.is_empty() {
                println!("No turns logged yet.");
            }
            for entry in session.log.entries() {
                println!("  {}  {}  [{}]", entry.timestamp, entry.query, entry.outcome);
            }
        }
        "export" => {
            let path = match parts.next() {
                Some(p) => PathBuf::from(p),
                None => export_dir.join(session.default_export_name()),
            };
            session.log.export_csv(&path)?;
            println!("Audit log written to {}", path.display());
        }
        "quit" | "exit" => return Ok(true),
        other => println!("Unknown command: /{}. Try /help.", other),
    }
    Ok(false)
}
