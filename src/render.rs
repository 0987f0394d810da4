//! Response rendering: source-type marker stripping and citation
//! extraction.
//!
//! The marker the model was told to emit is a side channel, not a
//! decision: routing happened before the model ran, so the declared type
//! is only surfaced for comparison against the routed mode. Citations come
//! from the retrieved set, never from parsing the reply, so every page the
//! model saw is disclosed whether or not it was quoted.

use std::collections::HashSet;

use crate::index::Hit;
use crate::models::{Citation, QueryMode};
use crate::prompt::SOURCE_TYPE_PREFIX;

/// Split a leading `SOURCE_TYPE:` marker line off the reply.
///
/// Matching is case-insensitive and tolerates surrounding whitespace. A
/// reply without a recognizable marker is returned whole with `None` for
/// the declared mode.
pub fn strip_marker(reply: &str) -> (Option<QueryMode>, String) {
    let trimmed = reply.trim_start();

    if let Some(head) = trimmed.get(..SOURCE_TYPE_PREFIX.len()) {
        if head.eq_ignore_ascii_case(SOURCE_TYPE_PREFIX) {
            let rest = &trimmed[SOURCE_TYPE_PREFIX.len()..];
            let (first_line, remainder) = match rest.find('\n') {
                Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                None => (rest, ""),
            };

            let declared = first_line.trim();
            let mode = if declared.eq_ignore_ascii_case("content") {
                Some(QueryMode::Content)
            } else if declared.eq_ignore_ascii_case("metadata") {
                Some(QueryMode::Metadata)
            } else {
                None
            };

            if mode.is_some() {
                return (mode, remainder.trim().to_string());
            }
        }
    }

    (None, reply.trim().to_string())
}

/// One citation per distinct (file, one-based page) pair over the
/// retrieved set, in retrieval order.
pub fn citations(hits: &[Hit<'_>]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for hit in hits {
        let citation = Citation {
            source_name: hit.record.source_name.clone(),
            page: hit.record.page_index + 1,
        };
        if seen.insert(citation.clone()) {
            out.push(citation);
        }
    }
    out
}
