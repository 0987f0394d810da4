//! In-memory vector index over corpus pages.
//!
//! The index is built exactly once per process from the full corpus and is
//! immutable afterwards; changing the document set means restarting the
//! process. Search is brute-force cosine distance over every stored vector,
//! which keeps results exact and deterministic at SOP-library scale.

use thiserror::Error;

use crate::embedder::{EmbedError, Embedder};
use crate::models::PageRecord;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("query dims mismatch: index holds {expected}-dim vectors, query has {got}")]
    DimsMismatch { expected: usize, got: usize },
    #[error("vector count mismatch: {records} records, {vectors} vectors")]
    CountMismatch { records: usize, vectors: usize },
}

/// One retrieval hit: a borrowed page record plus its cosine distance
/// from the query (lower is closer).
#[derive(Debug)]
pub struct Hit<'a> {
    pub record: &'a PageRecord,
    pub distance: f32,
}

/// Immutable brute-force nearest-neighbor index.
#[derive(Debug)]
pub struct VectorIndex {
    records: Vec<PageRecord>,
    vectors: Vec<Vec<f32>>,
    dims: usize,
}

impl VectorIndex {
    /// Embed every page and build the index.
    ///
    /// Texts are embedded in batches of `batch_size` through the given
    /// embedder; the same embedder must later produce the query vectors.
    /// Every returned vector is checked against the embedder's declared
    /// dimensionality before it is stored.
    pub async fn build(
        pages: Vec<PageRecord>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self, EmbedError> {
        let dims = embedder.dims();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(pages.len());

        for batch in pages.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
            let batch_vectors = embedder.embed(&texts).await?;
            for v in &batch_vectors {
                if v.len() != dims {
                    return Err(EmbedError::DimsMismatch {
                        expected: dims,
                        got: v.len(),
                    });
                }
            }
            vectors.extend(batch_vectors);
        }

        Ok(Self {
            records: pages,
            vectors,
            dims,
        })
    }

    /// Build an index from pre-computed vectors.
    pub fn from_embedded(
        records: Vec<PageRecord>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, IndexError> {
        if records.len() != vectors.len() {
            return Err(IndexError::CountMismatch {
                records: records.len(),
                vectors: vectors.len(),
            });
        }
        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        for v in &vectors {
            if v.len() != dims {
                return Err(IndexError::DimsMismatch {
                    expected: dims,
                    got: v.len(),
                });
            }
        }
        Ok(Self {
            records,
            vectors,
            dims,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Return the `min(k, len)` nearest pages, sorted by ascending cosine
    /// distance. Ties are broken by insertion order, so a fixed index and
    /// query always produce the same result list.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<Hit<'_>>, IndexError> {
        if query_vec.len() != self.dims {
            return Err(IndexError::DimsMismatch {
                expected: self.dims,
                got: query_vec.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(pos, v)| (pos, 1.0 - cosine_similarity(query_vec, v)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, distance)| Hit {
                record: &self.records[pos],
                distance,
            })
            .collect())
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`. Returns `0.0` for empty vectors,
/// vectors of different lengths, or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
