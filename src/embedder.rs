//! Embedding backends.
//!
//! Defines the [`Embedder`] trait and concrete implementations:
//! - **[`RemoteEmbedder`]** — calls an OpenAI-compatible embeddings API.
//! - **`LocalEmbedder`** — runs a fastembed model on-device (feature
//!   `local-embeddings`); no network calls after the model download.
//! - **[`MockEmbedder`]** — deterministic hashed bag-of-words vectors for
//!   tests and offline smoke runs.
//!
//! One embedder is created at startup and shared as `Arc<dyn Embedder>`
//! between index construction and query embedding, so the corpus and every
//! query pass through the same model. A failed call is terminal for its
//! caller; nothing in this module retries.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::EmbeddingConfig;

/// Error produced by an embedding backend.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("embedding API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    #[error("embedding count mismatch: sent {sent} texts, got {got} vectors")]
    CountMismatch { sent: usize, got: usize },
    #[error("embedding dims mismatch: expected {expected}, got {got}")]
    DimsMismatch { expected: usize, got: usize },
    #[error("embedding backend failed: {0}")]
    Backend(String),
}

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts: one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Embed a single query text.
pub async fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>, EmbedError> {
    let mut vectors = embedder.embed(&[text.to_string()]).await?;
    if vectors.len() != 1 {
        return Err(EmbedError::CountMismatch {
            sent: 1,
            got: vectors.len(),
        });
    }
    Ok(vectors.remove(0))
}

/// Create the configured [`Embedder`].
///
/// | Config value | Backend |
/// |--------------|---------|
/// | `"remote"` | [`RemoteEmbedder`] |
/// | `"local"` | `LocalEmbedder` (requires feature `local-embeddings`) |
/// | `"mock"` | [`MockEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "remote" => Ok(Arc::new(RemoteEmbedder::new(config)?)),
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Arc::new(LocalEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => anyhow::bail!(
            "Local embedding provider requires building with --features local-embeddings"
        ),
        "mock" => Ok(Arc::new(MockEmbedder::new(config.dims.unwrap_or(256)))),
        other => anyhow::bail!("Unknown embedding provider: {}", other),
    }
}

// ============ Remote (OpenAI-compatible) ============

/// Embedding backend for an OpenAI-compatible `POST /embeddings` endpoint.
///
/// The API key is read once at construction from the environment variable
/// named in the configuration. Each call sends one batch and makes exactly
/// one attempt; rate limits and server errors surface to the caller.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl RemoteEmbedder {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let dims = match config.dims {
            Some(d) if d > 0 => d,
            _ => anyhow::bail!("embedding.dims required for the remote provider"),
        };

        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!("{} environment variable not set", config.api_key_env)
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dims,
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response.json().await?;
        let vectors = parse_embeddings_response(&json)?;

        if vectors.len() != texts.len() {
            return Err(EmbedError::CountMismatch {
                sent: texts.len(),
                got: vectors.len(),
            });
        }
        for v in &vectors {
            if v.len() != self.dims {
                return Err(EmbedError::DimsMismatch {
                    expected: self.dims,
                    got: v.len(),
                });
            }
        }

        Ok(vectors)
    }
}

/// Parse an OpenAI-style embeddings response.
///
/// The API does not guarantee `data` ordering, so items are re-sorted by
/// their `index` field before the vectors are returned.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| EmbedError::InvalidResponse("missing data array".to_string()))?;

    let mut indexed: Vec<(i64, Vec<f32>)> = Vec::with_capacity(data.len());

    for (pos, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| EmbedError::InvalidResponse("missing embedding".to_string()))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        let index = item
            .get("index")
            .and_then(|i| i.as_i64())
            .unwrap_or(pos as i64);

        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

// ============ Local (fastembed) ============

/// On-device embedding backend via fastembed.
///
/// The model is downloaded on first use from Hugging Face and cached;
/// afterwards embedding runs entirely offline. Model initialization and
/// inference run on the blocking thread pool.
#[cfg(feature = "local-embeddings")]
pub struct LocalEmbedder {
    model_name: String,
    dims: usize,
    batch_size: usize,
}

#[cfg(feature = "local-embeddings")]
impl LocalEmbedder {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let model_name = config.model.clone();
        // Fail on unknown names at construction, not mid-ingest.
        resolve_fastembed_model(&model_name)?;
        let dims = config.dims.unwrap_or(local_model_dims(&model_name));
        Ok(Self {
            model_name,
            dims,
            batch_size: config.batch_size,
        })
    }
}

#[cfg(feature = "local-embeddings")]
fn resolve_fastembed_model(name: &str) -> anyhow::Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "multilingual-e5-small" => Ok(fastembed::EmbeddingModel::MultilingualE5Small),
        other => anyhow::bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, multilingual-e5-small",
            other
        ),
    }
}

#[cfg(feature = "local-embeddings")]
fn local_model_dims(name: &str) -> usize {
    match name {
        "all-minilm-l6-v2" => 384,
        "bge-small-en-v1.5" => 384,
        "bge-base-en-v1.5" => 768,
        "multilingual-e5-small" => 384,
        _ => 384,
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let fastembed_model = resolve_fastembed_model(&self.model_name)
            .map_err(|e| EmbedError::Backend(e.to_string()))?;
        let batch_size = self.batch_size;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = fastembed::TextEmbedding::try_new(
                fastembed::InitOptions::new(fastembed_model).with_show_download_progress(true),
            )
            .map_err(|e| EmbedError::Backend(format!("model init failed: {}", e)))?;

            model
                .embed(texts, Some(batch_size))
                .map_err(|e| EmbedError::Backend(e.to_string()))
        })
        .await
        .map_err(|e| EmbedError::Backend(e.to_string()))?
    }
}

// ============ Mock ============

/// Deterministic embedding backend with no model behind it.
///
/// Each text becomes a hashed bag-of-words vector: every lowercased
/// alphanumeric token is SHA-256 hashed into a bucket, and the bucket
/// counts form the vector. Texts sharing tokens get correlated vectors,
/// which is enough for relevance ordering in tests.
pub struct MockEmbedder {
    dims: usize,
}

impl MockEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dims];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            let digest = hasher.finalize();
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bytes) % self.dims as u64) as usize;
            vec[bucket] += 1.0;
        }
        vec
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_name(&self) -> &str {
        "mock"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}
