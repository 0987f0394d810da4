//! # SOP Assist
//!
//! A retrieval-grounded question answering tool for a controlled library
//! of SOP (Standard Operating Procedure) PDF documents.
//!
//! SOP Assist ingests every page of every PDF in a corpus directory,
//! embeds the pages once per process, and answers questions by retrieving
//! the nearest pages, assembling a grounded prompt, and invoking a hosted
//! chat model at temperature zero. Every answer carries citations for
//! every page consulted, and every completed turn lands in an append-only,
//! CSV-exportable audit log.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐   ┌───────────────┐   ┌─────────────┐
//! │ Loader  │──▶│ Embed + Index │──▶│ VectorIndex │
//! │ (PDFs)  │   │ (built once)  │   │ (in-memory) │
//! └─────────┘   └───────────────┘   └──────┬──────┘
//!                                          │ top-K pages
//!   question ──▶ Router ──▶ Prompt ──▶ Chat model ──▶ Render
//!                                                       │
//!                                       answer + citations + audit row
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sopa status                   # scan the corpus, no credentials needed
//! sopa ask "What is the deviation process?"
//! sopa chat                     # interactive session with /export
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Corpus scan and per-page PDF extraction |
//! | [`embedder`] | Embedding backends (remote, local, mock) |
//! | [`index`] | Build-once vector index and k-NN search |
//! | [`router`] | Content-vs-metadata query routing |
//! | [`prompt`] | Grounded prompt assembly |
//! | [`llm`] | Chat-completion client |
//! | [`render`] | Marker stripping and citation extraction |
//! | [`audit`] | Session audit log and CSV export |
//! | [`engine`] | Per-turn pipeline |
//! | [`chat`] | `ask` and `chat` command surfaces |
//! | [`status`] | Corpus status report |

pub mod audit;
pub mod chat;
pub mod config;
pub mod embedder;
pub mod engine;
pub mod index;
pub mod llm;
pub mod loader;
pub mod models;
pub mod prompt;
pub mod render;
pub mod router;
pub mod status;
