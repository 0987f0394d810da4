//! Core data models used throughout SOP Assist.
//!
//! These types represent the document pages, retrieval hits, citations, and
//! audit entries that flow through the question answering pipeline.

use std::fmt;

/// One page of text extracted from a source document.
///
/// Records are produced by the loader, validated there (blank pages never
/// make it out), and immutable afterwards. `page_index` is zero-based in
/// extraction order; user-facing page numbers are one-based.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub text: String,
    pub source_name: String,
    pub page_index: u32,
}

/// Catalog entry for one ingested file.
#[derive(Debug, Clone)]
pub struct SourceDoc {
    pub name: String,
    pub pages: u32,
    pub sha256: String,
}

/// A pointer back to one page of one source document.
///
/// `page` is one-based, matching what a reader sees in a PDF viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Citation {
    pub source_name: String,
    pub page: u32,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (p.{})", self.source_name, self.page)
    }
}

/// How a query should be answered: from page content, or from the
/// document catalog itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Content,
    Metadata,
}

impl QueryMode {
    pub fn label(&self) -> &'static str {
        match self {
            QueryMode::Content => "content",
            QueryMode::Metadata => "metadata",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the session audit log.
///
/// `timestamp` is RFC 3339 UTC at second precision, captured when the row
/// is appended. Rows are never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub query: String,
    pub outcome: String,
}
