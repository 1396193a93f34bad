#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("SSE parse error: {0}")]
    SseParse(String),

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: &'static str },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether this failure is worth retrying with backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Timeout => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_transient() {
        assert!(LlmError::RateLimited.is_transient());
    }

    #[test]
    fn timeout_is_transient() {
        assert!(LlmError::Timeout.is_transient());
    }

    #[test]
    fn parse_and_terminal_errors_are_not_transient() {
        assert!(!LlmError::SseParse("bad".into()).is_transient());
        assert!(!LlmError::Other("boom".into()).is_transient());
        assert!(!LlmError::RetriesExhausted { attempts: 3 }.is_transient());
        assert!(!LlmError::EmptyResponse { provider: "gemini" }.is_transient());
    }

    #[test]
    fn display_includes_attempt_count() {
        let err = LlmError::RetriesExhausted { attempts: 3 };
        assert_eq!(err.to_string(), "retries exhausted after 3 attempts");
    }
}
