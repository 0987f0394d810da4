//! Prompt assembly for content and metadata turns.
//!
//! Content prompts ground the model in the retrieved page excerpts, each
//! inside a tagged block naming its file and one-based page. Metadata
//! prompts ground the model in the document catalog instead and carry no
//! page text. Both instruct the model to open its reply with a source-type
//! marker line, which the renderer strips back out.

use thiserror::Error;

use crate::index::Hit;
use crate::models::SourceDoc;

/// Marker line prefix the model is instructed to emit.
pub const SOURCE_TYPE_PREFIX: &str = "SOURCE_TYPE:";

const PERSONA: &str = "You are a GxP compliance assistant for a controlled library of \
Standard Operating Procedures.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no retrieved context to ground an answer")]
    NoContext,
}

/// Assemble a content-mode prompt from the retrieved hits.
///
/// Refuses to assemble a prompt with zero excerpts: an ungrounded answer
/// is worse than no answer.
pub fn content_prompt(question: &str, hits: &[Hit<'_>]) -> Result<String, PromptError> {
    if hits.is_empty() {
        return Err(PromptError::NoContext);
    }

    let mut prompt = String::new();
    prompt.push_str(PERSONA);
    prompt.push_str(
        " Answer using only the excerpts below. If the excerpts do not contain the answer, \
         say so plainly instead of guessing. If the documents contain conflicting \
         information, highlight both versions.\n\n",
    );
    prompt.push_str("Excerpts:\n");
    prompt.push_str(&render_excerpts(hits));
    prompt.push_str("\n\nQuestion:\n");
    prompt.push_str(question);
    prompt.push_str("\n\nInstructions:\n");
    prompt.push_str("1. Begin your reply with the line \"SOURCE_TYPE: CONTENT\".\n");
    prompt.push_str(
        "2. Cite the source file and one-based page for every claim, e.g. SOP-001.pdf (p.3).\n",
    );
    prompt.push_str("3. Quote exact wording for limits, durations, and numeric requirements.\n");
    Ok(prompt)
}

/// Assemble a metadata-mode prompt from the document catalog.
pub fn metadata_prompt(question: &str, docs: &[SourceDoc]) -> String {
    let mut prompt = String::new();
    prompt.push_str(PERSONA);
    prompt.push_str(
        " The user is asking about the document library itself, not about page contents. \
         Answer only from the document list below.\n\n",
    );
    prompt.push_str("Indexed documents:\n");
    for doc in docs {
        prompt.push_str(&format!("- {} ({} pages)\n", doc.name, doc.pages));
    }
    prompt.push_str("\nQuestion:\n");
    prompt.push_str(question);
    prompt.push_str("\n\nInstructions:\n");
    prompt.push_str("1. Begin your reply with the line \"SOURCE_TYPE: METADATA\".\n");
    prompt.push_str("2. Name files exactly as listed; do not invent documents.\n");
    prompt
}

/// One tagged block per hit, separated by `---`.
fn render_excerpts(hits: &[Hit<'_>]) -> String {
    let blocks: Vec<String> = hits
        .iter()
        .map(|hit| {
            format!(
                "[{} p.{}]\n{}",
                hit.record.source_name,
                hit.record.page_index + 1,
                hit.record.text.trim()
            )
        })
        .collect();
    blocks.join("\n---\n")
}
