//! Repository indexing: crawl → summarize → embed → persist, with bounded
//! fan-out and per-file failure isolation.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;

use codelore_github::{GithubClient, TreeEntry};
use codelore_llm::{LlmProvider, RetryPolicy, retry};
use codelore_store::{ProjectStore, SourceFileEmbedding};

use crate::error::Result;
use crate::prompts;

#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    /// Concurrent per-file pipelines in flight.
    pub concurrency: usize,
    /// File content is truncated to this many characters before
    /// summarization to stay inside the model's token budget.
    pub max_summary_chars: usize,
    pub retry: RetryPolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            concurrency: 7,
            max_summary_chars: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

/// Summary of an indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub errors: Vec<String>,
}

enum FileOutcome {
    Indexed,
    Skipped,
    Failed(String),
}

/// Crawls a repository tree and persists one summarized, embedded record
/// per source file.
pub struct RepoIndexer<P, S> {
    github: GithubClient,
    provider: Arc<P>,
    store: Arc<S>,
    config: IndexConfig,
}

impl<P: LlmProvider, S: ProjectStore> RepoIndexer<P, S> {
    #[must_use]
    pub fn new(github: GithubClient, provider: Arc<P>, store: Arc<S>, config: IndexConfig) -> Self {
        Self {
            github,
            provider,
            store,
            config,
        }
    }

    /// Index every eligible file in the repository.
    ///
    /// Per-file failures are isolated: they are logged, recorded in the
    /// report's `errors`, and never abort sibling files. Binary or
    /// oversized blobs are skipped with a warning. Each record is persisted
    /// as soon as its embedding is ready.
    ///
    /// # Errors
    ///
    /// Returns an error only when the repository itself is unreachable
    /// (invalid URL, auth failure, tree fetch failure).
    pub async fn index_repository(
        &self,
        project_id: &str,
        github_url: &str,
        github_token: Option<&str>,
    ) -> Result<IndexReport> {
        let github = match github_token {
            Some(token) => self.github.with_token(Some(token.to_owned())),
            None => self.github.clone(),
        };

        let entries = github.crawl_tree(github_url).await?;
        let total = entries.len();
        tracing::info!(project_id, total, "indexing started");

        let github = &github;
        let outcomes: Vec<(String, FileOutcome)> = stream::iter(entries)
            .map(|entry| async move {
                let path = entry.path.clone();
                let outcome = self
                    .index_file(github, project_id, github_url, &entry)
                    .await;
                (path, outcome)
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let mut report = IndexReport {
            files_scanned: total,
            ..IndexReport::default()
        };
        for (path, outcome) in outcomes {
            match outcome {
                FileOutcome::Indexed => report.files_indexed += 1,
                FileOutcome::Skipped => report.files_skipped += 1,
                FileOutcome::Failed(reason) => report.errors.push(format!("{path}: {reason}")),
            }
        }

        tracing::info!(
            project_id,
            indexed = report.files_indexed,
            skipped = report.files_skipped,
            failed = report.errors.len(),
            "indexing complete"
        );
        Ok(report)
    }

    async fn index_file(
        &self,
        github: &GithubClient,
        project_id: &str,
        github_url: &str,
        entry: &TreeEntry,
    ) -> FileOutcome {
        match self.try_index_file(github, project_id, github_url, entry).await {
            Ok(true) => FileOutcome::Indexed,
            Ok(false) => FileOutcome::Skipped,
            Err(e) => {
                tracing::warn!(path = %entry.path, "file indexing failed: {e}");
                FileOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_index_file(
        &self,
        github: &GithubClient,
        project_id: &str,
        github_url: &str,
        entry: &TreeEntry,
    ) -> Result<bool> {
        let Some(content) = github.blob_text(github_url, entry).await? else {
            return Ok(false);
        };

        let prompt = prompts::file_summary(
            &entry.path,
            truncate_chars(&content, self.config.max_summary_chars),
        );
        let summary = retry(self.config.retry, || self.provider.complete(&prompt)).await?;
        let embedding = retry(self.config.retry, || self.provider.embed(&summary)).await?;

        self.store
            .upsert_embedding(SourceFileEmbedding {
                project_id: project_id.to_owned(),
                file_name: entry.path.clone(),
                source_code: content,
                summary,
                embedding,
            })
            .await?;
        Ok(true)
    }
}

/// Truncate on a char boundary after at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
