#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or invalid repository configuration; surfaced immediately,
    /// never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("GitHub error: {0}")]
    Github(#[from] codelore_github::GithubError),

    #[error("LLM error: {0}")]
    Llm(#[from] codelore_llm::LlmError),

    #[error("store error: {0}")]
    Store(#[from] codelore_store::StoreError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
