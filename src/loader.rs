//! Corpus loading: directory scan plus per-page PDF text extraction.
//!
//! The loader walks the configured corpus directory, matches files against
//! case-insensitive include globs, and extracts one text record per page.
//! A file that cannot be parsed is skipped with a warning; it never aborts
//! the scan. Pages whose extracted text is blank produce no record, but the
//! page index of every record reflects the page's true position in its
//! document so that citations line up with what a PDF viewer shows.

use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::models::{PageRecord, SourceDoc};

/// Everything learned from one scan of the corpus directory.
#[derive(Debug, Default)]
pub struct Corpus {
    /// Non-blank page records across all loaded files, in scan order.
    pub pages: Vec<PageRecord>,
    /// Catalog of successfully loaded files, in scan order.
    pub docs: Vec<SourceDoc>,
    /// Relative paths of files that matched but could not be loaded.
    pub skipped: Vec<String>,
}

impl Corpus {
    /// True when no page records were produced. Downstream treats this as
    /// "assistant unavailable", not as an error.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

pub fn load_corpus(config: &CorpusConfig) -> Result<Corpus> {
    let root = &config.dir;
    if !root.exists() {
        bail!("Corpus directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;

    let mut matched: Vec<(std::path::PathBuf, String)> = Vec::new();
    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if !include_set.is_match(&rel_str) {
            continue;
        }

        matched.push((path.to_path_buf(), rel_str));
    }

    // Sort for deterministic ordering
    matched.sort_by(|a, b| a.1.cmp(&b.1));

    let mut corpus = Corpus::default();
    for (path, rel_str) in matched {
        match load_pdf(&path) {
            Ok(loaded) => {
                corpus.docs.push(loaded.doc);
                corpus.pages.extend(loaded.pages);
            }
            Err(e) => {
                eprintln!("Warning: could not load {}: {:#}", rel_str, e);
                corpus.skipped.push(rel_str);
            }
        }
    }

    Ok(corpus)
}

struct LoadedFile {
    doc: SourceDoc,
    pages: Vec<PageRecord>,
}

fn load_pdf(path: &Path) -> Result<LoadedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = format!("{:x}", hasher.finalize());

    let page_texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .with_context(|| "PDF text extraction failed")?;

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut pages = Vec::new();
    for (i, text) in page_texts.iter().enumerate() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        pages.push(PageRecord {
            text: trimmed.to_string(),
            source_name: source_name.clone(),
            page_index: i as u32,
        });
    }

    Ok(LoadedFile {
        doc: SourceDoc {
            name: source_name,
            pages: page_texts.len() as u32,
            sha256,
        },
        pages,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use tempfile::TempDir;

    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn corpus_config(dir: &Path) -> CorpusConfig {
        CorpusConfig {
            dir: dir.to_path_buf(),
            include_globs: vec!["**/*.pdf".to_string()],
            follow_symlinks: false,
        }
    }

    #[test]
    fn loads_pages_in_order() {
        let tmp = TempDir::new().unwrap();
        write_pdf(
            &tmp.path().join("SOP-001.pdf"),
            &["Gowning procedure", "Cleanroom entry", "Exit and degown"],
        );

        let corpus = load_corpus(&corpus_config(tmp.path())).unwrap();
        assert_eq!(corpus.docs.len(), 1);
        assert_eq!(corpus.docs[0].name, "SOP-001.pdf");
        assert_eq!(corpus.docs[0].pages, 3);
        assert_eq!(corpus.docs[0].sha256.len(), 64);
        assert_eq!(corpus.pages.len(), 3);
        assert_eq!(corpus.pages[0].page_index, 0);
        assert_eq!(corpus.pages[2].page_index, 2);
        assert!(corpus.pages[1].text.contains("Cleanroom"));
    }

    #[test]
    fn unparseable_file_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write_pdf(&tmp.path().join("SOP-001.pdf"), &["Deviation handling"]);
        std::fs::write(tmp.path().join("broken.pdf"), b"not a pdf at all").unwrap();

        let corpus = load_corpus(&corpus_config(tmp.path())).unwrap();
        assert_eq!(corpus.docs.len(), 1);
        assert_eq!(corpus.skipped, vec!["broken.pdf".to_string()]);
        assert_eq!(corpus.pages.len(), 1);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        write_pdf(&tmp.path().join("SOP-UPPER.PDF"), &["Batch release"]);
        std::fs::write(tmp.path().join("notes.txt"), b"ignored").unwrap();

        let corpus = load_corpus(&corpus_config(tmp.path())).unwrap();
        assert_eq!(corpus.docs.len(), 1);
        assert_eq!(corpus.docs[0].name, "SOP-UPPER.PDF");
    }

    #[test]
    fn blank_page_produces_no_record_but_keeps_numbering() {
        let tmp = TempDir::new().unwrap();
        write_pdf(
            &tmp.path().join("SOP-002.pdf"),
            &["Sampling plan", "", "Retention samples"],
        );

        let corpus = load_corpus(&corpus_config(tmp.path())).unwrap();
        assert_eq!(corpus.docs[0].pages, 3);
        assert_eq!(corpus.pages.len(), 2);
        assert_eq!(corpus.pages[0].page_index, 0);
        // The page after the blank one keeps its true position.
        assert_eq!(corpus.pages[1].page_index, 2);
    }

    #[test]
    fn empty_directory_yields_empty_corpus() {
        let tmp = TempDir::new().unwrap();
        let corpus = load_corpus(&corpus_config(tmp.path())).unwrap();
        assert!(corpus.is_empty());
        assert!(corpus.docs.is_empty());
        assert!(corpus.skipped.is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = load_corpus(&corpus_config(&missing)).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn files_load_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        write_pdf(&tmp.path().join("SOP-010.pdf"), &["Water system"]);
        write_pdf(&tmp.path().join("SOP-002.pdf"), &["Calibration"]);

        let corpus = load_corpus(&corpus_config(tmp.path())).unwrap();
        let names: Vec<&str> = corpus.docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["SOP-002.pdf", "SOP-010.pdf"]);
    }
}
