//! Corpus status report.
//!
//! Scans the corpus directory and prints what the assistant would index:
//! per-file page counts and fingerprints, skipped files, and an
//! availability verdict. Reads no credentials and makes no network calls,
//! so it is safe to run before any API keys are configured.

use anyhow::Result;

use crate::config::Config;
use crate::loader::load_corpus;

/// Run the status command: scan the corpus and print a summary.
pub fn run_status(config: &Config) -> Result<()> {
    let corpus = load_corpus(&config.corpus)?;

    println!("SOP Assist — Corpus Status");
    println!("==========================");
    println!();
    println!("  Corpus dir:  {}", config.corpus.dir.display());
    println!(
        "  Embedding:   {} ({})",
        config.embedding.provider, config.embedding.model
    );
    println!("  Model:       {}", config.model.model);
    println!("  Top-K:       {}", config.retrieval.top_k);

    if !corpus.docs.is_empty() {
        println!();
        println!("  {:<32} {:>6}   {}", "FILE", "PAGES", "SHA-256");
        println!("  {}", "-".repeat(60));
        for doc in &corpus.docs {
            println!(
                "  {:<32} {:>6}   {}",
                doc.name,
                doc.pages,
                &doc.sha256[..12]
            );
        }
    }

    if !corpus.skipped.is_empty() {
        println!();
        println!("  Skipped ({} unreadable):", corpus.skipped.len());
        for name in &corpus.skipped {
            println!("    {}", name);
        }
    }

    println!();
    if corpus.is_empty() {
        println!("  Status: unavailable — no readable documents; queries are disabled");
    } else {
        println!(
            "  Status: ready ({} document{}, {} page{})",
            corpus.docs.len(),
            if corpus.docs.len() == 1 { "" } else { "s" },
            corpus.pages.len(),
            if corpus.pages.len() == 1 { "" } else { "s" }
        );
    }
    println!();

    Ok(())
}
