use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the ragtag pipeline.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the Qdrant instance that stores embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection used for document storage.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Base URL of the Ollama runtime used for chat and embeddings.
    pub ollama_url: String,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Strong model used for deep analysis and grounded answers.
    pub model_main: String,
    /// Model used for programming questions.
    pub model_code: String,
    /// Balanced general-purpose model.
    pub model_balanced: String,
    /// Number of fragments to retrieve per query.
    pub top_k: usize,
    /// Characters per text chunk during ingestion.
    pub chunk_size: usize,
    /// Character overlap between adjacent chunks.
    pub chunk_overlap: usize,
    /// Directory scanned for documents during ingestion.
    pub docs_dir: String,
}

/// Supported embedding backends for the pipeline.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Deterministic content-hash vectors, useful without a model runtime.
    Hash,
}

impl Config {
    /// Load configuration from environment variables, applying the defaults
    /// the pipeline shipped with when a variable is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            qdrant_url: load_env_or("QDRANT_URL", "http://127.0.0.1:6333"),
            qdrant_collection_name: load_env_or("QDRANT_COLLECTION_NAME", "docs"),
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            ollama_url: load_env_or("OLLAMA_URL", "http://127.0.0.1:11434"),
            embedding_provider: load_env_or("EMBEDDING_PROVIDER", "ollama")
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
            embedding_model: load_env_or("EMBEDDING_MODEL", "nomic-embed-text"),
            embedding_dimension: parse_env_or("EMBEDDING_DIMENSION", 768)?,
            model_main: load_env_or("MODEL_MAIN", "phi4:14b-q4_K_M"),
            model_code: load_env_or("MODEL_CODE", "mistral"),
            model_balanced: load_env_or("MODEL_BALANCED", "llama3.1:8b"),
            top_k: parse_env_or("TOP_K", 4)?,
            chunk_size: parse_env_or("CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_env_or("CHUNK_OVERLAP", 200)?,
            docs_dir: load_env_or("DOCS_DIR", "docs"),
        })
    }

    /// Resolve the configured model identifier for a routed tier.
    pub fn model_for(&self, tier: crate::query::ModelTier) -> &str {
        match tier {
            crate::query::ModelTier::Main => &self.model_main,
            crate::query::ModelTier::Code => &self.model_code,
            crate::query::ModelTier::Balanced => &self.model_balanced,
        }
    }
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hash" => Ok(Self::Hash),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        ollama_url = %config.ollama_url,
        embedding_provider = ?config.embedding_provider,
        top_k = config.top_k,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
