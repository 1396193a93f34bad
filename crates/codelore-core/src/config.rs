//! TOML configuration with environment-variable overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use codelore_github::GithubClient;
use codelore_llm::RetryPolicy;
use codelore_llm::gemini::GeminiProvider;

use crate::answer::AnswerConfig;
use crate::indexer::IndexConfig;
use crate::sync::SyncConfig;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub github: GithubConfig,
    pub sync: SyncSection,
    pub index: IndexSection,
    pub retrieval: RetrievalSection,
    pub retry: RetrySection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GithubConfig {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub max_commits: usize,
    pub concurrency: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    pub concurrency: usize,
    pub max_summary_chars: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub top_k: usize,
    pub min_similarity: f32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".into(),
            embedding_model: "text-embedding-004".into(),
            base_url: None,
            timeout_secs: 60,
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            max_commits: 10,
            concurrency: 7,
        }
    }
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            concurrency: 7,
            max_summary_chars: 10_000,
        }
    }
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_similarity: 0.5,
        }
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            github: GithubConfig::default(),
            sync: SyncSection::default(),
            index: IndexSection::default(),
            retrieval: RetrievalSection::default(),
            retry: RetrySection::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to full defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CODELORE_GEMINI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("CODELORE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("CODELORE_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("CODELORE_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("CODELORE_GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
        }
    }

    #[must_use]
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            max_commits: self.sync.max_commits,
            concurrency: self.sync.concurrency,
            retry: self.retry_policy(),
        }
    }

    #[must_use]
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            concurrency: self.index.concurrency,
            max_summary_chars: self.index.max_summary_chars,
            retry: self.retry_policy(),
        }
    }

    #[must_use]
    pub fn answer_config(&self) -> AnswerConfig {
        AnswerConfig {
            top_k: self.retrieval.top_k,
            min_similarity: self.retrieval.min_similarity,
            retry: self.retry_policy(),
        }
    }

    /// Build the Gemini provider from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when no API key is configured.
    pub fn gemini_provider(&self) -> anyhow::Result<GeminiProvider> {
        let api_key = self
            .llm
            .api_key
            .clone()
            .context("no Gemini API key configured (llm.api_key or CODELORE_GEMINI_API_KEY)")?;
        let mut provider = GeminiProvider::new(
            api_key,
            self.llm.model.clone(),
            Some(self.llm.embedding_model.clone()),
        )
        .with_timeout(Duration::from_secs(self.llm.timeout_secs));
        if let Some(base_url) = &self.llm.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        Ok(provider)
    }

    #[must_use]
    pub fn github_client(&self) -> GithubClient {
        GithubClient::new(self.github.token.clone())
    }
}
