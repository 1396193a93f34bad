//! Test-only mock LLM provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{CompletionStream, LlmProvider};

/// Deterministic in-process double for [`LlmProvider`].
///
/// Completions drain a scripted queue, falling back to `default_response`.
/// Needle-based failure triggers keep behavior deterministic under
/// concurrent fan-out, where call order is not observable.
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    /// First matching needle wins; used to give different prompts different
    /// completions when call order is not observable.
    pub responses_by_needle: Vec<(String, String)>,
    pub embedding: Vec<f32>,
    /// First matching needle wins; used to give different texts different vectors.
    pub embeddings_by_needle: Vec<(String, Vec<f32>)>,
    /// Completions whose prompt contains this needle fail.
    pub fail_completions_containing: Option<String>,
    /// Embeddings whose input contains this needle fail.
    pub fail_embeddings_containing: Option<String>,
    /// Number of leading calls that fail with `RateLimited` before succeeding.
    transient_failures: Arc<Mutex<u32>>,
    /// Emit an `Err` chunk after this many streamed chunks, then stop.
    pub stream_error_after: Option<usize>,
    complete_calls: Arc<AtomicUsize>,
    embed_calls: Arc<AtomicUsize>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            responses_by_needle: Vec::new(),
            embedding: vec![0.0; 8],
            embeddings_by_needle: Vec::new(),
            fail_completions_containing: None,
            fail_embeddings_containing: None,
            transient_failures: Arc::new(Mutex::new(0)),
            stream_error_after: None,
            complete_calls: Arc::new(AtomicUsize::new(0)),
            embed_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_response_for(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses_by_needle.push((needle.into(), response.into()));
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    #[must_use]
    pub fn with_embedding_for(mut self, needle: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings_by_needle.push((needle.into(), embedding));
        self
    }

    #[must_use]
    pub fn failing_completions_containing(mut self, needle: impl Into<String>) -> Self {
        self.fail_completions_containing = Some(needle.into());
        self
    }

    #[must_use]
    pub fn failing_embeddings_containing(mut self, needle: impl Into<String>) -> Self {
        self.fail_embeddings_containing = Some(needle.into());
        self
    }

    /// Fail the first `count` calls (completions or embeddings) with `RateLimited`.
    #[must_use]
    pub fn with_transient_failures(self, count: u32) -> Self {
        *self.transient_failures.lock().unwrap() = count;
        self
    }

    /// Emit an `Err` chunk after `count` streamed chunks, then end the stream.
    #[must_use]
    pub fn with_stream_error_after(mut self, count: usize) -> Self {
        self.stream_error_after = Some(count);
        self
    }

    #[must_use]
    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    fn take_transient_failure(&self) -> bool {
        let mut remaining = self.transient_failures.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

impl LlmProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_transient_failure() {
            return Err(LlmError::RateLimited);
        }
        if let Some(needle) = &self.fail_completions_containing
            && prompt.contains(needle.as_str())
        {
            return Err(LlmError::Other("mock completion failure".into()));
        }
        for (needle, response) in &self.responses_by_needle {
            if prompt.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn complete_stream(&self, prompt: &str) -> Result<CompletionStream, LlmError> {
        let response = self.complete(prompt).await?;
        let mut chunks: Vec<Result<String, LlmError>> = response
            .split_inclusive(' ')
            .map(|c| Ok(c.to_owned()))
            .collect();
        if let Some(cut) = self.stream_error_after {
            chunks.truncate(cut);
            chunks.push(Err(LlmError::SseParse("mock stream dropped".into())));
        }
        Ok(Box::pin(tokio_stream::iter(chunks)))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_transient_failure() {
            return Err(LlmError::RateLimited);
        }
        if let Some(needle) = &self.fail_embeddings_containing
            && text.contains(needle.as_str())
        {
            return Err(LlmError::Other("mock embedding failure".into()));
        }
        for (needle, vector) in &self.embeddings_by_needle {
            if text.contains(needle.as_str()) {
                return Ok(vector.clone());
            }
        }
        Ok(self.embedding.clone())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
