//! TOML-based configuration for newsrag
//!
//! Every setting has a default, so an empty `newsrag.toml` (or none at all)
//! describes a working local setup. A handful of settings can be overridden
//! from the environment (or a `.env` file) without touching the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `NEWSRAG_STORE_URL` | `store.url` |
//! | `NEWSRAG_GENERATOR_MODEL` | `models.generator` model path or name |
//! | `NEWSRAG_EMBEDDER_MODEL` | `models.embedder` model |

use crate::llm::client::GeneratorProvider;
use crate::rag::embeddings::EmbedderProvider;
use crate::rag::pipeline::RagSettings;
use crate::types::GenerationParams;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "newsrag.toml";

pub const ENV_STORE_URL: &str = "NEWSRAG_STORE_URL";
pub const ENV_GENERATOR_MODEL: &str = "NEWSRAG_GENERATOR_MODEL";
pub const ENV_EMBEDDER_MODEL: &str = "NEWSRAG_EMBEDDER_MODEL";

/// Root configuration structure loaded from newsrag.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsragConfig {
    #[serde(default)]
    pub nlp: NlpConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for NewsragConfig {
    fn default() -> Self {
        Self {
            nlp: NlpConfig::default(),
            rag: RagConfig::default(),
            models: ModelsConfig::default(),
            store: StoreConfig::default(),
            crawler: CrawlerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============= NLP Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlpConfig {
    /// tiktoken encoding used for chunking and prompt budgeting
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Remove stopwords before chunking
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Fragments this short or shorter are dropped at extraction
    #[serde(default = "default_min_fragment_chars")]
    pub min_fragment_chars: usize,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            tokenizer: default_tokenizer(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            normalize: true,
            min_fragment_chars: default_min_fragment_chars(),
        }
    }
}

fn default_tokenizer() -> String {
    "cl100k_base".to_string()
}

fn default_chunk_size() -> usize {
    512
}

fn default_overlap() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_min_fragment_chars() -> usize {
    100
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Generator context window in tokens
    #[serde(default = "default_context_length")]
    pub context_length: u32,

    /// Prompt ceiling and generation limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// CPU threads for local generation
    #[serde(default = "default_threads")]
    pub threads: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            context_length: default_context_length(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            threads: default_threads(),
        }
    }
}

fn default_context_length() -> u32 {
    4096
}

fn default_max_tokens() -> usize {
    3500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> usize {
    3
}

fn default_threads() -> u32 {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1);
    (cpus / 2).max(4)
}

// ============= Model Configuration =============

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub embedder: EmbedderConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmbedderConfig {
    FastEmbed {
        #[serde(default = "default_embedder_model")]
        model: String,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
    },
}

/// fastembed when compiled in, Ollama otherwise.
impl Default for EmbedderConfig {
    fn default() -> Self {
        if cfg!(feature = "local-embeddings") {
            EmbedderConfig::FastEmbed {
                model: default_embedder_model(),
            }
        } else {
            EmbedderConfig::Ollama {
                base_url: default_ollama_url(),
                model: DEFAULT_OLLAMA_EMBEDDER.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratorConfig {
    LlamaCpp {
        #[serde(default = "default_generator_path")]
        model_path: String,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
    },
}

/// llama.cpp when compiled in, Ollama otherwise.
impl Default for GeneratorConfig {
    fn default() -> Self {
        if cfg!(feature = "llamacpp") {
            GeneratorConfig::LlamaCpp {
                model_path: default_generator_path(),
            }
        } else {
            GeneratorConfig::Ollama {
                base_url: default_ollama_url(),
                model: DEFAULT_OLLAMA_GENERATOR.to_string(),
            }
        }
    }
}

pub const DEFAULT_OLLAMA_EMBEDDER: &str = "all-minilm";
pub const DEFAULT_OLLAMA_GENERATOR: &str = "zephyr";

fn default_embedder_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_generator_path() -> String {
    "~/models/zephyr-7b-alpha.Q4_K_M.gguf".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

// ============= Store Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Fragment database file, or `:memory:`
    #[serde(default = "default_store_url")]
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
        }
    }
}

fn default_store_url() -> String {
    "./data/newsrag.db".to_string()
}

// ============= Crawler Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_sources() -> Vec<String> {
    [
        "https://www.coindesk.com",
        "https://cointelegraph.com",
        "https://www.newsbtc.com",
        "https://cryptoslate.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    crate::crawl::DEFAULT_USER_AGENT.to_string()
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

// ============= Loading =============

impl NewsragConfig {
    /// Load, apply environment overrides, expand `~`, and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults
    /// (still with environment overrides applied).
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.expand_paths();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse without overrides or validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `NEWSRAG_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are
    /// ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_STORE_URL) {
            self.store.url = url;
        }

        if let Some(name) = lookup(ENV_GENERATOR_MODEL) {
            match &mut self.models.generator {
                GeneratorConfig::LlamaCpp { model_path } => *model_path = name,
                GeneratorConfig::Ollama { model, .. } => *model = name,
            }
        }

        if let Some(name) = lookup(ENV_EMBEDDER_MODEL) {
            match &mut self.models.embedder {
                EmbedderConfig::FastEmbed { model } | EmbedderConfig::Ollama { model, .. } => {
                    *model = name
                }
            }
        }
    }

    /// Expand a leading `~` in filesystem paths against `HOME`.
    pub fn expand_paths(&mut self) {
        if let GeneratorConfig::LlamaCpp { model_path } = &mut self.models.generator {
            *model_path = expand_home(model_path);
        }
        self.store.url = expand_home(&self.store.url);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.nlp.chunk_size == 0 {
            return invalid("nlp.chunk_size must be greater than 0".to_string());
        }
        if self.nlp.overlap >= self.nlp.chunk_size {
            return invalid(format!(
                "nlp.overlap ({}) must be smaller than nlp.chunk_size ({})",
                self.nlp.overlap, self.nlp.chunk_size
            ));
        }

        let rag = &self.rag;
        if rag.max_tokens == 0 {
            return invalid("rag.max_tokens must be greater than 0".to_string());
        }
        if rag.max_tokens > rag.context_length as usize {
            return invalid(format!(
                "rag.max_tokens ({}) must not exceed rag.context_length ({})",
                rag.max_tokens, rag.context_length
            ));
        }
        if !(0.0..=2.0).contains(&rag.temperature) {
            return invalid(format!(
                "rag.temperature must be within [0, 2], got {}",
                rag.temperature
            ));
        }
        if !(rag.top_p > 0.0 && rag.top_p <= 1.0) {
            return invalid(format!("rag.top_p must be within (0, 1], got {}", rag.top_p));
        }
        if rag.top_k == 0 {
            return invalid("rag.top_k must be at least 1".to_string());
        }

        if self.crawler.sources.is_empty() {
            return invalid("crawler.sources must list at least one URL".to_string());
        }
        for source in &self.crawler.sources {
            if let Err(e) = Url::parse(source) {
                return invalid(format!("crawler.sources: invalid URL '{}': {}", source, e));
            }
        }

        if self.store.url.trim().is_empty() {
            return invalid("store.url must not be empty".to_string());
        }

        Ok(())
    }

    // ============= Conversions =============

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.rag.max_tokens,
            temperature: self.rag.temperature,
            top_p: self.rag.top_p,
        }
    }

    pub fn rag_settings(&self) -> RagSettings {
        RagSettings {
            chunk_size: self.nlp.chunk_size,
            chunk_overlap: self.nlp.overlap,
            top_k: self.rag.top_k,
            max_tokens: self.rag.max_tokens,
            generation: self.generation_params(),
        }
    }

    pub fn embedder_provider(&self) -> EmbedderProvider {
        match &self.models.embedder {
            EmbedderConfig::FastEmbed { model } => EmbedderProvider::FastEmbed {
                model: model.clone(),
            },
            EmbedderConfig::Ollama { base_url, model } => EmbedderProvider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            },
        }
    }

    pub fn generator_provider(&self) -> GeneratorProvider {
        match &self.models.generator {
            GeneratorConfig::LlamaCpp { model_path } => GeneratorProvider::LlamaCpp {
                model_path: model_path.clone(),
                context_length: self.rag.context_length,
                threads: self.rag.threads,
            },
            GeneratorConfig::Ollama { base_url, model } => GeneratorProvider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            },
        }
    }
}

/// Replace a leading `~` with `$HOME`. Paths without one, or with `HOME`
/// unset, are returned unchanged.
pub fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };
    match std::env::var("HOME") {
        Ok(home) => format!("{}{}", home.trim_end_matches('/'), rest),
        Err(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = NewsragConfig::from_toml_str("").unwrap();
        assert_eq!(config, NewsragConfig::default());
        assert_eq!(config.nlp.chunk_size, 512);
        assert_eq!(config.nlp.overlap, 64);
        assert_eq!(config.rag.context_length, 4096);
        assert_eq!(config.rag.max_tokens, 3500);
        assert_eq!(config.rag.top_k, 3);
        assert!(config.rag.threads >= 4);
        assert_eq!(config.crawler.sources.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tagged_model_sections() {
        let config = NewsragConfig::from_toml_str(
            r#"
            [models.embedder]
            type = "ollama"
            model = "all-minilm"

            [models.generator]
            type = "ollama"
            base_url = "http://gpu-box:11434"
            model = "zephyr"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.embedder_provider(),
            EmbedderProvider::Ollama {
                base_url: "http://localhost:11434".to_string(),
                model: "all-minilm".to_string(),
            }
        );
        assert_eq!(config.generator_provider().name(), "Ollama");
    }

    #[test]
    #[cfg(all(
        any(feature = "ollama", feature = "local-embeddings"),
        any(feature = "ollama", feature = "llamacpp")
    ))]
    fn test_default_models_are_compiled_in() {
        let config = NewsragConfig::default();
        assert!(config.embedder_provider().is_available());
        assert!(config.generator_provider().is_available());
    }

    #[test]
    #[cfg(all(feature = "ollama", not(feature = "local")))]
    fn test_default_build_uses_ollama_models() {
        let config = NewsragConfig::default();
        assert_eq!(config.embedder_provider().name(), "ollama");
        assert_eq!(config.generator_provider().name(), "Ollama");
    }

    #[test]
    fn test_overrides() {
        let mut config = NewsragConfig::default();
        config.models.generator = GeneratorConfig::LlamaCpp {
            model_path: default_generator_path(),
        };
        config.apply_overrides_from(|key| match key {
            ENV_STORE_URL => Some(":memory:".to_string()),
            ENV_GENERATOR_MODEL => Some("/srv/models/mistral.gguf".to_string()),
            ENV_EMBEDDER_MODEL => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.store.url, ":memory:");
        assert_eq!(
            config.models.generator,
            GeneratorConfig::LlamaCpp {
                model_path: "/srv/models/mistral.gguf".to_string()
            }
        );
        assert_eq!(config.models.embedder, EmbedderConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = NewsragConfig::default();
        config.nlp.overlap = config.nlp.chunk_size;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = NewsragConfig::default();
        config.rag.max_tokens = 5000;
        assert!(config.validate().is_err());

        let mut config = NewsragConfig::default();
        config.crawler.sources = vec!["not a url".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(expand_home("/abs/model.gguf"), "/abs/model.gguf");
        assert_eq!(expand_home("./data/newsrag.db"), "./data/newsrag.db");
        assert_eq!(expand_home("~user/model.gguf"), "~user/model.gguf");
    }

    #[test]
    fn test_default_config_survives_serialization() {
        let config = NewsragConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(NewsragConfig::from_toml_str(&text).unwrap(), config);
    }
}
