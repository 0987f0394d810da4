//! Turn engine: corpus bootstrap plus the per-turn pipeline.
//!
//! Bootstrap loads the corpus and builds the vector index exactly once;
//! an empty corpus yields an unavailable engine instead of an error, and
//! no query ever reaches retrieval or the model while unavailable. Each
//! turn then runs route → retrieve → assemble → invoke → render in order,
//! one turn at a time. A failure anywhere in that chain aborts the turn
//! and appends nothing to the audit log.

use std::sync::Arc;
use thiserror::Error;

use crate::audit::Session;
use crate::config::Config;
use crate::embedder::{embed_query, EmbedError, Embedder};
use crate::index::{IndexError, VectorIndex};
use crate::llm::{ChatClient, ChatError};
use crate::loader::load_corpus;
use crate::models::{Citation, QueryMode, SourceDoc};
use crate::prompt::{content_prompt, metadata_prompt, PromptError};
use crate::render::{citations, strip_marker};
use crate::router::Router;

/// Error that aborts one turn. Nothing is retried and nothing is logged.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] EmbedError),
    #[error("retrieval failed: {0}")]
    Index(#[from] IndexError),
    #[error("prompt assembly failed: {0}")]
    Prompt(#[from] PromptError),
    #[error("model invocation failed: {0}")]
    Model(#[from] ChatError),
}

/// What the caller gets back from a completed turn.
#[derive(Debug)]
pub struct TurnReport {
    /// Marker-stripped answer text.
    pub answer: String,
    /// Every page consulted, de-duplicated, in retrieval order. Empty for
    /// metadata turns.
    pub citations: Vec<Citation>,
    /// The mode the router chose before retrieval.
    pub mode: QueryMode,
    /// The mode the model declared in its reply, if it emitted the marker.
    pub declared_mode: Option<QueryMode>,
}

/// Outcome of bootstrapping: either a ready engine or the reason no
/// queries can be served.
pub enum EngineStartup {
    Ready(Engine),
    Unavailable { reason: String },
}

/// The built, read-only query engine for one process lifetime.
pub struct Engine {
    index: VectorIndex,
    docs: Vec<SourceDoc>,
    router: Router,
    embedder: Arc<dyn Embedder>,
    chat: ChatClient,
    top_k: usize,
}

impl Engine {
    /// Load the corpus and build the index once.
    ///
    /// A corpus with no usable pages returns
    /// [`EngineStartup::Unavailable`]; the caller decides how to surface
    /// that. Embedding the corpus happens here and nowhere else.
    pub async fn bootstrap(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        chat: ChatClient,
    ) -> anyhow::Result<EngineStartup> {
        let corpus = load_corpus(&config.corpus)?;
        if corpus.is_empty() {
            return Ok(EngineStartup::Unavailable {
                reason: format!(
                    "no readable documents found in {}",
                    config.corpus.dir.display()
                ),
            });
        }

        let index =
            VectorIndex::build(corpus.pages, embedder.as_ref(), config.embedding.batch_size)
                .await?;

        Ok(EngineStartup::Ready(Engine {
            index,
            docs: corpus.docs,
            router: Router::new()?,
            embedder,
            chat,
            top_k: config.retrieval.top_k,
        }))
    }

    /// Catalog of indexed documents, in scan order.
    pub fn docs(&self) -> &[SourceDoc] {
        &self.docs
    }

    /// Number of indexed pages.
    pub fn page_count(&self) -> usize {
        self.index.len()
    }

    /// Run one complete turn against the engine.
    ///
    /// Content turns retrieve the `top_k` nearest pages and ground the
    /// prompt in them; metadata turns skip retrieval and ground in the
    /// catalog. Only a fully rendered turn is appended to the session log.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        query: &str,
    ) -> Result<TurnReport, TurnError> {
        let mode = self.router.route(query);

        let (prompt, hits) = match mode {
            QueryMode::Content => {
                let query_vec = embed_query(self.embedder.as_ref(), query).await?;
                let hits = self.index.search(&query_vec, self.top_k)?;
                let prompt = content_prompt(query, &hits)?;
                (prompt, hits)
            }
            QueryMode::Metadata => (metadata_prompt(query, &self.docs), Vec::new()),
        };

        let reply = self.chat.complete(&prompt).await?;
        let (declared_mode, answer) = strip_marker(&reply);

        if let Some(declared) = declared_mode {
            if declared != mode {
                eprintln!(
                    "Warning: model declared {} but the query was routed as {}",
                    declared, mode
                );
            }
        }

        let cites = citations(&hits);
        let outcome = match mode {
            QueryMode::Content => format!(
                "answered (content, {} source{})",
                cites.len(),
                if cites.len() == 1 { "" } else { "s" }
            ),
            QueryMode::Metadata => "answered (metadata)".to_string(),
        };
        session.log.append(query, &outcome);

        Ok(TurnReport {
            answer,
            citations: cites,
            mode,
            declared_mode,
        })
    }
}
