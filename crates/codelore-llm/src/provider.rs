use std::pin::Pin;

use futures_core::Stream;

use crate::error::LlmError;

/// Incremental text chunks from a streaming completion.
///
/// The stream is finite and not restartable: it ends when the provider
/// closes the connection, and an `Err` item means the stream terminated
/// abnormally. Callers that need the full text again must re-issue the
/// request.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

pub trait LlmProvider: Send + Sync {
    /// Generate the full completion for a prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, rate limited, or
    /// returns an invalid response.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Open a streaming completion for a prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be opened; mid-stream failures
    /// surface as `Err` items on the returned stream.
    fn complete_stream(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<CompletionStream, LlmError>> + Send;

    /// Embed text into a fixed-dimension vector.
    ///
    /// Every call through one provider instance yields vectors of the same
    /// dimensionality; similarity search across models is undefined.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider has no embedding model configured or
    /// the request fails.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn name(&self) -> &str;
}
