use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_api_base")]
    pub api_base: String,
    #[serde(default = "default_embedding_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_base: default_embedding_api_base(),
            api_key_env: default_embedding_api_key_env(),
            model: default_embedding_model(),
            dims: None,
            batch_size: default_batch_size(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "remote".to_string()
}
fn default_embedding_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_embedding_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_api_base")]
    pub api_base: String,
    #[serde(default = "default_model_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model_name")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_model_api_base(),
            api_key_env: default_model_api_key_env(),
            model: default_model_name(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

fn default_model_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_model_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}
fn default_model_name() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_model_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./audits")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate corpus
    if config.corpus.dir.as_os_str().is_empty() {
        anyhow::bail!("corpus.dir must not be empty");
    }
    if config.corpus.include_globs.is_empty() {
        anyhow::bail!("corpus.include_globs must contain at least one pattern");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "remote" | "local" | "mock" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be remote, local, or mock.",
            other
        ),
    }
    if config.embedding.provider == "remote" {
        match config.embedding.dims {
            Some(d) if d > 0 => {}
            _ => anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            ),
        }
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    // Validate retrieval
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    // Validate model
    if config.model.model.is_empty() {
        anyhow::bail!("model.model must not be empty");
    }
    if config.model.max_tokens == 0 {
        anyhow::bail!("model.max_tokens must be > 0");
    }

    Ok(config)
}
