//! RAG answer streaming: embed the question, retrieve similar files, stream
//! a grounded completion through an explicit producer-consumer channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use codelore_llm::{LlmProvider, RetryPolicy, retry};
use codelore_store::{ProjectStore, Question, RankedFile};

use crate::error::{CoreError, Result};
use crate::prompts;

#[derive(Debug, Clone, Copy)]
pub struct AnswerConfig {
    /// Maximum retrieved files per question.
    pub top_k: usize,
    /// Cosine similarity floor; files at or below it are not used.
    pub min_similarity: f32,
    pub retry: RetryPolicy,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            min_similarity: 0.5,
            retry: RetryPolicy::default(),
        }
    }
}

/// One item on the answer channel.
///
/// `Done` is the explicit terminal signal and carries the accumulated full
/// answer; a stream that ends without it terminated abnormally and the
/// whole operation may be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    Token(String),
    Done { answer: String },
}

/// An in-flight answer: the files used for grounding (available up front)
/// and the event stream.
pub struct AnswerStream {
    pub file_references: Vec<RankedFile>,
    pub events: ReceiverStream<Result<AnswerEvent>>,
}

/// Read-path engine: retrieval plus streaming answer generation. Operates
/// on whatever is currently indexed; it never waits for indexing.
pub struct AnswerEngine<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
    config: AnswerConfig,
}

impl<P: LlmProvider, S: ProjectStore> AnswerEngine<P, S> {
    #[must_use]
    pub fn new(provider: Arc<P>, store: Arc<S>, config: AnswerConfig) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Answer a question about the project.
    ///
    /// Embedding and retrieval failures abort before any token is produced.
    /// Once streaming starts, a mid-stream provider failure surfaces as an
    /// `Err` item followed by the end of the stream, without a `Done` event.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the question, retrieval, or opening
    /// the streaming completion fails.
    pub async fn answer(&self, project_id: &str, question: &str) -> Result<AnswerStream> {
        let query = retry(self.config.retry, || self.provider.embed(question)).await?;
        let file_references = self
            .store
            .find_similar(
                project_id,
                &query,
                self.config.top_k,
                self.config.min_similarity,
            )
            .await?;

        tracing::debug!(
            project_id,
            used_files = file_references.len(),
            "retrieved context for question"
        );

        let context = build_context(&file_references);
        let prompt = prompts::answer_question(&context, question);
        let mut upstream =
            retry(self.config.retry, || self.provider.complete_stream(&prompt)).await?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut answer = String::new();
            while let Some(chunk) = upstream.next().await {
                match chunk {
                    Ok(text) => {
                        answer.push_str(&text);
                        if tx.send(Ok(AnswerEvent::Token(text))).await.is_err() {
                            // Consumer went away; stop producing.
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("answer stream terminated abnormally: {e}");
                        let _ = tx.send(Err(CoreError::Llm(e))).await;
                        return;
                    }
                }
            }
            let _ = tx.send(Ok(AnswerEvent::Done { answer })).await;
        });

        Ok(AnswerStream {
            file_references,
            events: ReceiverStream::new(rx),
        })
    }

    /// Persist an answered question with the files that grounded it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn save_answer(
        &self,
        project_id: &str,
        user_id: &str,
        question: &str,
        answer: String,
        file_references: Vec<RankedFile>,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.store
            .save_question(Question {
                id,
                project_id: project_id.to_owned(),
                user_id: user_id.to_owned(),
                question: question.to_owned(),
                answer,
                file_references: file_references.into_iter().map(|r| r.file).collect(),
            })
            .await?;
        Ok(id)
    }
}

fn build_context(files: &[RankedFile]) -> String {
    use std::fmt::Write as _;

    let mut context = String::new();
    for ranked in files {
        let _ = write!(
            context,
            "source: {}\ncode content: {}\nsummary of the file: {}\n\n",
            ranked.file.file_name, ranked.file.source_code, ranked.file.summary
        );
    }
    context
}
