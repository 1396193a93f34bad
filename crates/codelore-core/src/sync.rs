//! Commit synchronization: list remote commits, dedupe against the store,
//! summarize the new ones, persist.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;

use codelore_github::{GithubClient, RepoCommit};
use codelore_llm::{LlmProvider, RetryPolicy, retry};
use codelore_store::{CommitRecord, ProjectStore};

use crate::error::{CoreError, Result};
use crate::prompts;

#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// How many of the newest remote commits to consider per sync.
    pub max_commits: usize,
    /// Concurrent summarization calls in flight.
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_commits: 10,
            concurrency: 7,
            retry: RetryPolicy::default(),
        }
    }
}

/// Idempotent commit sync engine. Safe to call repeatedly: only commits not
/// yet stored for the project are summarized and persisted.
pub struct CommitSync<P, S> {
    github: GithubClient,
    provider: Arc<P>,
    store: Arc<S>,
    config: SyncConfig,
}

impl<P: LlmProvider, S: ProjectStore> CommitSync<P, S> {
    #[must_use]
    pub fn new(github: GithubClient, provider: Arc<P>, store: Arc<S>, config: SyncConfig) -> Self {
        Self {
            github,
            provider,
            store,
            config,
        }
    }

    /// Synchronize the project's commit log with the remote repository.
    ///
    /// Returns the number of newly persisted commits. A commit whose diff
    /// fetch or summarization fails is still persisted with an empty
    /// summary; only total failures (unknown project, missing URL,
    /// unreachable repository, store failure) abort the call.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` when the project is unknown or has
    /// no GitHub URL, and propagates GitHub/store failures.
    pub async fn sync_commits(&self, project_id: &str) -> Result<u64> {
        let project = self
            .store
            .project(project_id)
            .await?
            .ok_or_else(|| CoreError::Configuration(format!("unknown project {project_id}")))?;
        let github_url = project
            .github_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                CoreError::Configuration(format!("project {project_id} has no GitHub URL"))
            })?;

        let github = match project.github_token {
            Some(token) => self.github.with_token(Some(token)),
            None => self.github.clone(),
        };

        let remote = github
            .list_commits(&github_url, self.config.max_commits)
            .await?;
        let stored = self.store.commit_hashes(project_id).await?;
        let unprocessed: Vec<RepoCommit> = remote
            .into_iter()
            .filter(|commit| !stored.contains(&commit.hash))
            .collect();

        if unprocessed.is_empty() {
            tracing::debug!(project_id, "no unprocessed commits");
            return Ok(0);
        }

        tracing::info!(
            project_id,
            count = unprocessed.len(),
            "summarizing unprocessed commits"
        );

        let github = &github;
        let github_url = github_url.as_str();
        let records: Vec<CommitRecord> = stream::iter(unprocessed)
            .map(|commit| async move {
                let summary = match self.summarize_commit(github, github_url, &commit.hash).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        tracing::warn!(
                            commit_hash = %commit.hash,
                            "commit summarization degraded to empty: {e}"
                        );
                        String::new()
                    }
                };
                to_record(project_id, commit, summary)
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let inserted = self.store.insert_commits(records).await?;
        tracing::info!(project_id, inserted, "commit sync complete");
        Ok(inserted)
    }

    async fn summarize_commit(
        &self,
        github: &GithubClient,
        github_url: &str,
        commit_hash: &str,
    ) -> Result<String> {
        let diff = github.fetch_diff(github_url, commit_hash).await?;
        let prompt = prompts::commit_summary(&diff);
        let summary = retry(self.config.retry, || self.provider.complete(&prompt)).await?;
        Ok(summary)
    }
}

fn to_record(project_id: &str, commit: RepoCommit, summary: String) -> CommitRecord {
    CommitRecord {
        project_id: project_id.to_owned(),
        commit_hash: commit.hash,
        commit_message: commit.message,
        commit_author_name: commit.author_name,
        commit_author_avatar: commit.author_avatar,
        commit_date: commit.date,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use codelore_llm::mock::MockProvider;
    use codelore_store::{MemoryStore, Project};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn project(id: &str, url: &str) -> Project {
        Project {
            id: id.into(),
            github_url: Some(url.into()),
            github_token: None,
        }
    }

    fn commit_json(sha: &str, date: &str) -> serde_json::Value {
        serde_json::json!({
            "sha": sha,
            "commit": {"message": format!("msg {sha}"), "author": {"name": "dev", "date": date}},
            "author": {"avatar_url": "https://avatars.test/dev"}
        })
    }

    async fn mount_commits(server: &MockServer, commits: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/repos/o/r/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(commits))
            .mount(server)
            .await;
    }

    async fn mount_diffs(server: &MockServer) {
        for sha in ["c1", "c2", "c3"] {
            Mock::given(method("GET"))
                .and(path(format!("/repos/o/r/commits/{sha}")))
                .respond_with(
                    ResponseTemplate::new(200).set_body_string(format!("diff for {sha}")),
                )
                .mount(server)
                .await;
        }
    }

    fn engine(
        server: &MockServer,
        provider: Arc<MockProvider>,
        store: Arc<MemoryStore>,
    ) -> CommitSync<MockProvider, MemoryStore> {
        let github = GithubClient::new(None).with_base_url(server.uri());
        CommitSync::new(github, provider, store, SyncConfig::default())
    }

    #[tokio::test]
    async fn unknown_project_is_configuration_error() {
        let server = MockServer::start().await;
        let sync = engine(
            &server,
            Arc::new(MockProvider::default()),
            Arc::new(MemoryStore::new()),
        );
        let result = sync.sync_commits("nope").await;
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn missing_github_url_is_configuration_error() {
        let server = MockServer::start().await;
        let store = MemoryStore::new().with_project(Project {
            id: "p1".into(),
            github_url: None,
            github_token: None,
        });
        let sync = engine(&server, Arc::new(MockProvider::default()), Arc::new(store));
        let result = sync.sync_commits("p1").await;
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn syncs_only_unprocessed_commits() {
        let server = MockServer::start().await;
        mount_commits(
            &server,
            serde_json::json!([
                commit_json("c1", "2024-03-03T00:00:00Z"),
                commit_json("c2", "2024-03-02T00:00:00Z"),
                commit_json("c3", "2024-03-01T00:00:00Z"),
            ]),
        )
        .await;
        mount_diffs(&server).await;

        let url = format!("{}/o/r", server.uri());
        let store = Arc::new(MemoryStore::new().with_project(project("p1", &url)));
        let provider = Arc::new(MockProvider::default());

        // Seed c2 and c3 as already processed.
        store
            .insert_commits(vec![seed_commit("p1", "c2"), seed_commit("p1", "c3")])
            .await
            .unwrap();

        let sync = engine(&server, Arc::clone(&provider), Arc::clone(&store));
        let inserted = sync.sync_commits("p1").await.unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(provider.complete_calls(), 1);

        let stored = store.commits("p1").await.unwrap();
        let new = stored.iter().find(|c| c.commit_hash == "c1").unwrap();
        assert_eq!(new.summary, "mock response");
        assert_eq!(new.commit_author_name, "dev");
    }

    #[tokio::test]
    async fn second_sync_persists_nothing_and_calls_no_llm() {
        let server = MockServer::start().await;
        mount_commits(
            &server,
            serde_json::json!([
                commit_json("c1", "2024-03-03T00:00:00Z"),
                commit_json("c2", "2024-03-02T00:00:00Z"),
            ]),
        )
        .await;
        mount_diffs(&server).await;

        let url = format!("{}/o/r", server.uri());
        let store = Arc::new(MemoryStore::new().with_project(project("p1", &url)));
        let provider = Arc::new(MockProvider::default());
        let sync = engine(&server, Arc::clone(&provider), Arc::clone(&store));

        assert_eq!(sync.sync_commits("p1").await.unwrap(), 2);
        let calls_after_first = provider.complete_calls();

        assert_eq!(sync.sync_commits("p1").await.unwrap(), 0);
        assert_eq!(provider.complete_calls(), calls_after_first);
    }

    #[tokio::test]
    async fn summarization_failure_degrades_to_empty_summary() {
        let server = MockServer::start().await;
        mount_commits(
            &server,
            serde_json::json!([commit_json("c1", "2024-03-03T00:00:00Z")]),
        )
        .await;
        mount_diffs(&server).await;

        let url = format!("{}/o/r", server.uri());
        let store = Arc::new(MemoryStore::new().with_project(project("p1", &url)));
        let provider = Arc::new(MockProvider::default().failing_completions_containing("diff for c1"));
        let sync = engine(&server, provider, Arc::clone(&store));

        assert_eq!(sync.sync_commits("p1").await.unwrap(), 1);
        let stored = store.commits("p1").await.unwrap();
        assert_eq!(stored[0].summary, "");
    }

    #[tokio::test]
    async fn unreachable_repository_aborts_whole_sync() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let url = format!("{}/o/r", server.uri());
        let store = Arc::new(MemoryStore::new().with_project(project("p1", &url)));
        let sync = engine(&server, Arc::new(MockProvider::default()), Arc::clone(&store));

        let result = sync.sync_commits("p1").await;
        assert!(matches!(result, Err(CoreError::Github(_))));
        assert!(store.commits("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transient_rate_limit_is_retried_through() {
        let server = MockServer::start().await;
        mount_commits(
            &server,
            serde_json::json!([commit_json("c1", "2024-03-03T00:00:00Z")]),
        )
        .await;
        mount_diffs(&server).await;

        let url = format!("{}/o/r", server.uri());
        let store = Arc::new(MemoryStore::new().with_project(project("p1", &url)));
        let provider = Arc::new(MockProvider::default().with_transient_failures(1));
        let github = GithubClient::new(None).with_base_url(server.uri());
        let config = SyncConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                initial_delay: std::time::Duration::from_millis(5),
            },
            ..SyncConfig::default()
        };
        let sync = CommitSync::new(github, Arc::clone(&provider), Arc::clone(&store), config);

        assert_eq!(sync.sync_commits("p1").await.unwrap(), 1);
        assert_eq!(provider.complete_calls(), 2);
        assert_eq!(store.commits("p1").await.unwrap()[0].summary, "mock response");
    }

    fn seed_commit(project_id: &str, hash: &str) -> CommitRecord {
        CommitRecord {
            project_id: project_id.into(),
            commit_hash: hash.into(),
            commit_message: String::new(),
            commit_author_name: String::new(),
            commit_author_avatar: String::new(),
            commit_date: chrono::Utc::now(),
            summary: String::new(),
        }
    }
}
