//! In-memory reference implementation of [`ProjectStore`].

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::store::ProjectStore;
use crate::types::{
    CommitRecord, FileReference, Project, Question, RankedFile, SourceFileEmbedding,
};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Default)]
struct Inner {
    projects: Vec<Project>,
    commits: Vec<CommitRecord>,
    embeddings: Vec<SourceFileEmbedding>,
    questions: Vec<Question>,
}

/// Brute-force cosine-scan store backed by `RwLock`ed vectors.
///
/// Embedding rows keep their first-insertion position on upsert so that
/// similarity ties still break toward the earliest-indexed file.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Seed a project; convenient for tests and onboarding flows.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned, which cannot happen on a store that
    /// has just been constructed.
    #[must_use]
    pub fn with_project(self, project: Project) -> Self {
        {
            let mut inner = self.inner.write().expect("fresh lock cannot be poisoned");
            inner.projects.push(project);
        }
        self
    }

    /// Number of stored embedding rows across all projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn embedding_count(&self) -> Result<usize, StoreError> {
        let inner = self.inner.read().map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(inner.embeddings.len())
    }

    /// Saved questions for a project, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn questions(&self, project_id: &str) -> Result<Vec<Question>, StoreError> {
        let inner = self.inner.read().map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(inner
            .questions
            .iter()
            .filter(|q| q.project_id == project_id)
            .cloned()
            .collect())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

/// Cosine similarity between two vectors; 0.0 when either is zero-length
/// or all-zero. Mismatched dimensionality is truncated by `zip`, which the
/// store contract rules out upstream.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl ProjectStore for MemoryStore {
    fn project(&self, project_id: &str) -> BoxFuture<'_, Result<Option<Project>, StoreError>> {
        let project_id = project_id.to_owned();
        Box::pin(async move {
            let inner = self
                .inner
                .read()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            Ok(inner.projects.iter().find(|p| p.id == project_id).cloned())
        })
    }

    fn commit_hashes(
        &self,
        project_id: &str,
    ) -> BoxFuture<'_, Result<HashSet<String>, StoreError>> {
        let project_id = project_id.to_owned();
        Box::pin(async move {
            let inner = self
                .inner
                .read()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            Ok(inner
                .commits
                .iter()
                .filter(|c| c.project_id == project_id)
                .map(|c| c.commit_hash.clone())
                .collect())
        })
    }

    fn insert_commits(&self, commits: Vec<CommitRecord>) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move {
            let mut inner = self
                .inner
                .write()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            let mut inserted = 0u64;
            for commit in commits {
                let exists = inner.commits.iter().any(|c| {
                    c.project_id == commit.project_id && c.commit_hash == commit.commit_hash
                });
                if !exists {
                    inner.commits.push(commit);
                    inserted += 1;
                }
            }
            Ok(inserted)
        })
    }

    fn commits(&self, project_id: &str) -> BoxFuture<'_, Result<Vec<CommitRecord>, StoreError>> {
        let project_id = project_id.to_owned();
        Box::pin(async move {
            let inner = self
                .inner
                .read()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            Ok(inner
                .commits
                .iter()
                .filter(|c| c.project_id == project_id)
                .cloned()
                .collect())
        })
    }

    fn upsert_embedding(
        &self,
        record: SourceFileEmbedding,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut inner = self
                .inner
                .write()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            let position = inner
                .embeddings
                .iter()
                .position(|e| e.project_id == record.project_id && e.file_name == record.file_name);
            match position {
                Some(i) => inner.embeddings[i] = record,
                None => inner.embeddings.push(record),
            }
            Ok(())
        })
    }

    fn find_similar(
        &self,
        project_id: &str,
        query: &[f32],
        top_k: usize,
        min_similarity: f32,
    ) -> BoxFuture<'_, Result<Vec<RankedFile>, StoreError>> {
        let project_id = project_id.to_owned();
        let query = query.to_vec();
        Box::pin(async move {
            let inner = self
                .inner
                .read()
                .map_err(|e| StoreError::Lock(e.to_string()))?;

            let mut ranked: Vec<RankedFile> = inner
                .embeddings
                .iter()
                .filter(|e| e.project_id == project_id)
                .map(|e| RankedFile {
                    file: FileReference::from(e),
                    similarity: cosine_similarity(&query, &e.embedding),
                })
                .filter(|r| r.similarity > min_similarity)
                .collect();

            // Stable sort keeps insertion order for equal similarities.
            ranked.sort_by(|a, b| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            ranked.truncate(top_k);
            Ok(ranked)
        })
    }

    fn save_question(&self, question: Question) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut inner = self
                .inner
                .write()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            inner.questions.push(question);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn commit(project_id: &str, hash: &str) -> CommitRecord {
        CommitRecord {
            project_id: project_id.into(),
            commit_hash: hash.into(),
            commit_message: format!("commit {hash}"),
            commit_author_name: "dev".into(),
            commit_author_avatar: String::new(),
            commit_date: Utc::now(),
            summary: String::new(),
        }
    }

    fn embedding(project_id: &str, file_name: &str, vector: Vec<f32>) -> SourceFileEmbedding {
        SourceFileEmbedding {
            project_id: project_id.into(),
            file_name: file_name.into(),
            source_code: format!("// {file_name}"),
            summary: format!("summary of {file_name}"),
            embedding: vector,
        }
    }

    #[tokio::test]
    async fn project_lookup() {
        let store = MemoryStore::new().with_project(Project {
            id: "p1".into(),
            github_url: Some("https://github.com/o/r".into()),
            github_token: None,
        });
        let found = store.project("p1").await.unwrap().unwrap();
        assert_eq!(found.github_url.as_deref(), Some("https://github.com/o/r"));
        assert!(store.project("p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_commits_skips_existing_hashes() {
        let store = MemoryStore::new();
        let first = store
            .insert_commits(vec![commit("p1", "c1"), commit("p1", "c2")])
            .await
            .unwrap();
        assert_eq!(first, 2);

        let second = store
            .insert_commits(vec![commit("p1", "c2"), commit("p1", "c3")])
            .await
            .unwrap();
        assert_eq!(second, 1);

        let hashes = store.commit_hashes("p1").await.unwrap();
        assert_eq!(hashes.len(), 3);
    }

    #[tokio::test]
    async fn same_hash_in_different_projects_is_distinct() {
        let store = MemoryStore::new();
        store.insert_commits(vec![commit("p1", "c1")]).await.unwrap();
        let inserted = store.insert_commits(vec![commit("p2", "c1")]).await.unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn upsert_replaces_by_project_and_file_name() {
        let store = MemoryStore::new();
        store
            .upsert_embedding(embedding("p1", "src/lib.rs", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert_embedding(embedding("p1", "src/lib.rs", vec![0.0, 1.0]))
            .await
            .unwrap();
        assert_eq!(store.embedding_count().unwrap(), 1);

        let hits = store
            .find_similar("p1", &[0.0, 1.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn find_similar_orders_by_descending_similarity() {
        let store = MemoryStore::new();
        store
            .upsert_embedding(embedding("p1", "far.rs", vec![0.2, 0.98]))
            .await
            .unwrap();
        store
            .upsert_embedding(embedding("p1", "near.rs", vec![1.0, 0.05]))
            .await
            .unwrap();
        store
            .upsert_embedding(embedding("p1", "mid.rs", vec![0.7, 0.7]))
            .await
            .unwrap();

        let hits = store
            .find_similar("p1", &[1.0, 0.0], 10, 0.0)
            .await
            .unwrap();
        let names: Vec<&str> = hits.iter().map(|h| h.file.file_name.as_str()).collect();
        assert_eq!(names, vec!["near.rs", "mid.rs", "far.rs"]);
        assert!(hits[0].similarity >= hits[1].similarity);
        assert!(hits[1].similarity >= hits[2].similarity);
    }

    #[tokio::test]
    async fn find_similar_filters_below_floor_and_truncates() {
        let store = MemoryStore::new();
        store
            .upsert_embedding(embedding("p1", "hit.rs", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert_embedding(embedding("p1", "orthogonal.rs", vec![0.0, 1.0]))
            .await
            .unwrap();

        let hits = store
            .find_similar("p1", &[1.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file.file_name, "hit.rs");

        let capped = store
            .find_similar("p1", &[1.0, 0.0], 0, 0.0)
            .await
            .unwrap();
        assert!(capped.is_empty());
    }

    #[tokio::test]
    async fn find_similar_never_crosses_project_scope() {
        let store = MemoryStore::new();
        store
            .upsert_embedding(embedding("p1", "a.rs", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert_embedding(embedding("p2", "b.rs", vec![1.0, 0.0]))
            .await
            .unwrap();

        let hits = store
            .find_similar("p1", &[1.0, 0.0], 10, 0.0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file.file_name, "a.rs");
    }

    #[tokio::test]
    async fn find_similar_breaks_ties_by_insertion_order() {
        let store = MemoryStore::new();
        store
            .upsert_embedding(embedding("p1", "first.rs", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert_embedding(embedding("p1", "second.rs", vec![1.0, 0.0]))
            .await
            .unwrap();

        let hits = store
            .find_similar("p1", &[1.0, 0.0], 1, 0.0)
            .await
            .unwrap();
        assert_eq!(hits[0].file.file_name, "first.rs");
    }

    #[tokio::test]
    async fn upsert_preserves_first_insertion_position_for_ties() {
        let store = MemoryStore::new();
        store
            .upsert_embedding(embedding("p1", "first.rs", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert_embedding(embedding("p1", "second.rs", vec![1.0, 0.0]))
            .await
            .unwrap();
        // Re-index the first file; it must not lose its tie-break position.
        store
            .upsert_embedding(embedding("p1", "first.rs", vec![1.0, 0.0]))
            .await
            .unwrap();

        let hits = store
            .find_similar("p1", &[1.0, 0.0], 1, 0.0)
            .await
            .unwrap();
        assert_eq!(hits[0].file.file_name, "first.rs");
    }

    #[tokio::test]
    async fn save_question_appends() {
        let store = MemoryStore::new();
        store
            .save_question(Question {
                id: Uuid::new_v4(),
                project_id: "p1".into(),
                user_id: "u1".into(),
                question: "q".into(),
                answer: "a".into(),
                file_references: vec![],
            })
            .await
            .unwrap();
        assert_eq!(store.questions("p1").unwrap().len(), 1);
        assert!(store.questions("p2").unwrap().is_empty());
    }

    #[test]
    fn cosine_similarity_identical_direction() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cosine_similarity_is_bounded(
            a in prop::collection::vec(-1000.0f32..1000.0, 4),
            b in prop::collection::vec(-1000.0f32..1000.0, 4),
        ) {
            let sim = cosine_similarity(&a, &b);
            prop_assert!((-1.0 - 1e-3..=1.0 + 1e-3).contains(&(f64::from(sim))));
        }

        #[test]
        fn cosine_similarity_is_symmetric(
            a in prop::collection::vec(-10.0f32..10.0, 4),
            b in prop::collection::vec(-10.0f32..10.0, 4),
        ) {
            prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        }
    }
}
