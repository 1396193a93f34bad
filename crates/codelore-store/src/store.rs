use std::collections::HashSet;
use std::pin::Pin;

use crate::error::StoreError;
use crate::types::{CommitRecord, Project, Question, RankedFile, SourceFileEmbedding};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence collaborator for the ingestion and retrieval pipeline.
///
/// Writers target disjoint logical keys (`(project_id, commit_hash)` for
/// commits, `(project_id, file_name)` for embeddings), so implementations
/// need no cross-item locking. Backends are free to accelerate
/// `find_similar` with a vector index as long as the contract (top-k by
/// cosine similarity, project-scoped, thresholded) holds.
pub trait ProjectStore: Send + Sync {
    /// Look up a project by id.
    fn project(&self, project_id: &str) -> BoxFuture<'_, Result<Option<Project>, StoreError>>;

    /// All commit hashes already persisted for a project.
    fn commit_hashes(&self, project_id: &str)
    -> BoxFuture<'_, Result<HashSet<String>, StoreError>>;

    /// Bulk-insert commit records, skipping hashes already present for the
    /// project. Returns the number actually inserted.
    fn insert_commits(&self, commits: Vec<CommitRecord>) -> BoxFuture<'_, Result<u64, StoreError>>;

    /// All commits for a project, in insertion order.
    fn commits(&self, project_id: &str) -> BoxFuture<'_, Result<Vec<CommitRecord>, StoreError>>;

    /// Insert or replace the embedding row keyed by
    /// `(project_id, file_name)`.
    fn upsert_embedding(
        &self,
        record: SourceFileEmbedding,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Top-`top_k` files by cosine similarity to `query`, scoped to
    /// `project_id`, keeping only similarities strictly above
    /// `min_similarity`; ties break toward the earliest-indexed row.
    fn find_similar(
        &self,
        project_id: &str,
        query: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> BoxFuture<'_, Result<Vec<RankedFile>, StoreError>>;

    /// Persist an answered question once.
    fn save_question(&self, question: Question) -> BoxFuture<'_, Result<(), StoreError>>;
}
