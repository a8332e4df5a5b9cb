//! Application configuration from environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.
//! CLI flags override the output directory on top of this.

use crate::backend::{Backend, OllamaBackend, OpenAiBackend};
use crate::error::Result;
use crate::llm::{LlmClient, DEFAULT_MODEL};
use crate::retrieval::embed::DEFAULT_EMBEDDING_MODEL;
use crate::retrieval::{Embedder, LexicalEmbedder, OpenAiEmbedder};
use crate::PipelineError;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.1:8b";

/// Hosted or local LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Groq,
    OpenAi,
    Ollama,
}

impl Provider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Groq => GROQ_BASE_URL,
            Self::OpenAi => OPENAI_BASE_URL,
            Self::Ollama => OLLAMA_BASE_URL,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Groq => DEFAULT_MODEL,
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => OLLAMA_DEFAULT_MODEL,
        }
    }

    /// Whether the provider speaks the OpenAI chat API and needs a key.
    pub fn is_openai_compatible(self) -> bool {
        matches!(self, Self::Groq | Self::OpenAi)
    }
}

impl FromStr for Provider {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown LLM_PROVIDER {other:?} (expected groq, openai or ollama)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingProvider {
    #[default]
    Lexical,
    OpenAi,
}

impl FromStr for EmbeddingProvider {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(Self::Lexical),
            "openai" => Ok(Self::OpenAi),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown EMBEDDING_PROVIDER {other:?} (expected lexical or openai)"
            ))),
        }
    }
}

/// Resolved runtime configuration.
#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub embedding_provider: EmbeddingProvider,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_provider", &self.embedding_provider)
            .field("embedding_base_url", &self.embedding_base_url)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_api_key", &self.embedding_api_key.as_ref().map(|_| "***"))
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match get("LLM_PROVIDER") {
            Some(name) => name.parse()?,
            None => Provider::default(),
        };
        let embedding_provider = match get("EMBEDDING_PROVIDER") {
            Some(name) => name.parse()?,
            None => EmbeddingProvider::default(),
        };
        let api_key = get("LLM_API_KEY").or_else(|| get("GROQ_API_KEY"));

        Ok(Self {
            provider,
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| provider.default_base_url().to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            embedding_provider,
            embedding_base_url: get("EMBEDDING_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            embedding_model: get("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_api_key: get("EMBEDDING_API_KEY").or_else(|| api_key.clone()),
            api_key,
            output_dir: get("BATTLE_CARD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.is_openai_compatible() && self.api_key.is_none() {
            return Err(PipelineError::InvalidConfig(format!(
                "{:?} requires an API key (set GROQ_API_KEY or LLM_API_KEY)",
                self.provider
            )));
        }
        if self.model.is_empty() {
            return Err(PipelineError::InvalidConfig("LLM_MODEL is empty".to_string()));
        }
        Ok(())
    }

    /// LLM client for the configured provider, after validation.
    pub fn llm_client(&self) -> Result<LlmClient> {
        self.validate()?;
        let backend: Arc<dyn Backend> = match self.provider {
            Provider::Ollama => Arc::new(OllamaBackend),
            Provider::Groq | Provider::OpenAi => {
                let mut backend = OpenAiBackend::new();
                if let Some(ref key) = self.api_key {
                    backend = backend.with_api_key(key.clone());
                }
                Arc::new(backend)
            }
        };
        LlmClient::builder(&self.base_url)
            .backend(backend)
            .model(&self.model)
            .build()
    }

    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        match self.embedding_provider {
            EmbeddingProvider::Lexical => Ok(Arc::new(LexicalEmbedder::new())),
            EmbeddingProvider::OpenAi => {
                let mut embedder = OpenAiEmbedder::new(&self.embedding_base_url, &self.embedding_model)?;
                if let Some(ref key) = self.embedding_api_key {
                    embedder = embedder.with_api_key(key.clone());
                }
                Ok(Arc::new(embedder))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_target_groq() {
        let cfg = config(&[("GROQ_API_KEY", "gsk-abc")]).unwrap();
        assert_eq!(cfg.provider, Provider::Groq);
        assert_eq!(cfg.base_url, GROQ_BASE_URL);
        assert_eq!(cfg.model, "llama-3.1-8b-instant");
        assert_eq!(cfg.embedding_provider, EmbeddingProvider::Lexical);
        assert_eq!(cfg.output_dir, PathBuf::from("."));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_missing_key_rejected_for_hosted_provider() {
        let cfg = config(&[("GROQ_API_KEY", "  ")]).unwrap();
        assert!(matches!(cfg.validate(), Err(PipelineError::InvalidConfig(_))));
        assert!(cfg.llm_client().is_err());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let cfg = config(&[("LLM_PROVIDER", "Ollama"), ("BATTLE_CARD_OUTPUT_DIR", "cards")]).unwrap();
        assert_eq!(cfg.base_url, OLLAMA_BASE_URL);
        assert_eq!(cfg.model, OLLAMA_DEFAULT_MODEL);
        assert_eq!(cfg.output_dir, PathBuf::from("cards"));

        let client = cfg.llm_client().unwrap();
        assert_eq!(client.backend_name(), "ollama");
    }

    #[test]
    fn test_llm_api_key_wins_over_groq_key() {
        let cfg = config(&[
            ("LLM_PROVIDER", "openai"),
            ("LLM_API_KEY", "sk-1"),
            ("GROQ_API_KEY", "gsk-2"),
            ("LLM_MODEL", "gpt-4o"),
        ])
        .unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("sk-1"));
        assert_eq!(cfg.embedding_api_key.as_deref(), Some("sk-1"));
        assert_eq!(cfg.model, "gpt-4o");
    }

    #[test]
    fn test_unknown_provider() {
        assert!(config(&[("LLM_PROVIDER", "bard")]).is_err());
        assert!(config(&[("EMBEDDING_PROVIDER", "faiss")]).is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let cfg = config(&[("GROQ_API_KEY", "gsk-secret-value")]).unwrap();
        assert!(!format!("{cfg:?}").contains("secret"));
    }

    #[test]
    fn test_embedder_selection() {
        let cfg = config(&[("EMBEDDING_PROVIDER", "openai"), ("EMBEDDING_API_KEY", "sk-e")]).unwrap();
        assert_eq!(cfg.embedder().unwrap().name(), "openai");
        assert_eq!(config(&[]).unwrap().embedder().unwrap().name(), "lexical");
    }
}
