//! Query routing: decide how a question should be answered before any
//! retrieval happens.
//!
//! Questions about the document library itself ("what SOPs do you have")
//! are answered from the catalog; everything else is answered from page
//! content. The decision is a fixed pattern match, so the same question
//! always routes the same way. The model later declares which source type
//! it answered from, but that declaration never overrides this router.

use anyhow::Result;
use regex::RegexSet;

use crate::models::QueryMode;

/// Catalog-intent phrasings. Anything that matches none of these is a
/// content question.
const METADATA_PATTERNS: &[&str] = &[
    r"(?i)\bwhat\s+(sops?|documents?|files?|procedures?|sources?)\s+(do\s+you\s+have|are\s+(available|loaded|indexed))",
    r"(?i)\b(list|show\s+me)\s+(the\s+|all\s+|your\s+)?(sops?|documents?|files?|procedures?|sources?)\b",
    r"(?i)\bhow\s+many\s+(sops?|documents?|files?|pages?|procedures?)\b",
    r"(?i)\bwhat('s|\s+is)\s+in\s+(the|your)\s+(library|corpus|knowledge\s+base)\b",
    r"(?i)\bwhich\s+(sops?|documents?|files?|procedures?)\s+(do\s+you\s+have|are\s+(available|loaded|indexed))\b",
    r"(?i)\bdo\s+you\s+have\s+(an?\s+|any\s+)?(sops?|documents?|procedures?)\s+(on|about|for|covering)\b",
];

/// Compiled query router.
pub struct Router {
    metadata: RegexSet,
}

impl Router {
    pub fn new() -> Result<Self> {
        Ok(Self {
            metadata: RegexSet::new(METADATA_PATTERNS)?,
        })
    }

    pub fn route(&self, query: &str) -> QueryMode {
        if self.metadata.is_match(query) {
            QueryMode::Metadata
        } else {
            QueryMode::Content
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_questions_route_to_metadata() {
        let router = Router::new().unwrap();
        for query in [
            "What SOPs do you have?",
            "what documents are available",
            "List the procedures",
            "Show me your documents",
            "How many SOPs are loaded?",
            "What is in your library?",
            "Do you have an SOP on gowning?",
        ] {
            assert_eq!(router.route(query), QueryMode::Metadata, "query: {query}");
        }
    }

    #[test]
    fn ordinary_questions_route_to_content() {
        let router = Router::new().unwrap();
        for query in [
            "What is the gowning procedure for cleanroom entry?",
            "How long must batch records be retained?",
            "Who approves a planned deviation?",
            "Summarize the water sampling schedule.",
        ] {
            assert_eq!(router.route(query), QueryMode::Content, "query: {query}");
        }
    }

    #[test]
    fn routing_is_deterministic() {
        let router = Router::new().unwrap();
        let q = "what files are indexed right now?";
        assert_eq!(router.route(q), router.route(q));
    }
}
