use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::crawl::is_ignored;
use crate::error::{GithubError, Result};

const API_BASE: &str = "https://api.github.com";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_DIFF: &str = "application/vnd.github.v3.diff";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blobs larger than this are skipped rather than fetched.
const MAX_BLOB_BYTES: u64 = 1024 * 1024;

/// Normalized commit metadata from the hosting provider.
#[derive(Debug, Clone)]
pub struct RepoCommit {
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub author_avatar: String,
    pub date: DateTime<Utc>,
}

/// One blob in the repository tree.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
    pub size: u64,
}

/// GitHub REST API client with an optional personal-access token.
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    token: Option<String>,
    api_base: String,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("client", &"<reqwest::Client>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GithubClient {
    /// # Panics
    ///
    /// Panics if the underlying `reqwest` client cannot be constructed
    /// (unreachable in practice with only a timeout and user agent).
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("codelore/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client builder should not fail with timeout and user_agent");
        Self {
            client,
            token,
            api_base: API_BASE.to_owned(),
        }
    }

    /// Override the API base URL. Intended for tests only.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Derive a client using a different access token (per-project override).
    #[must_use]
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            token,
            api_base: self.api_base.clone(),
        }
    }

    /// Extract `(owner, repo)` from an https GitHub URL.
    ///
    /// # Errors
    ///
    /// Returns `GithubError::InvalidUrl` when the URL does not end in two
    /// non-empty path segments.
    pub fn parse_repo_url(github_url: &str) -> Result<(String, String)> {
        let trimmed = github_url
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .trim_end_matches('/');
        let mut segments = trimmed.rsplit('/');
        let repo = segments.next().unwrap_or_default();
        let owner = segments.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() || owner.contains(':') {
            return Err(GithubError::InvalidUrl(github_url.to_owned()));
        }
        Ok((owner.to_owned(), repo.to_owned()))
    }

    fn get(&self, url: String, accept: &'static str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url).header("Accept", accept);
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        tracing::error!("GitHub API error {status}: {message}");
        Err(GithubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// List the most recent `limit` commits, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the repository URL is invalid or the API call
    /// fails (auth failure, unknown repository, network).
    pub async fn list_commits(&self, github_url: &str, limit: usize) -> Result<Vec<RepoCommit>> {
        let (owner, repo) = Self::parse_repo_url(github_url)?;
        let url = format!(
            "{}/repos/{owner}/{repo}/commits?per_page={limit}",
            self.api_base
        );
        let response = Self::check(self.get(url, ACCEPT_JSON).send().await?).await?;
        let commits: Vec<ApiCommit> = response.json().await?;

        let mut commits: Vec<RepoCommit> = commits.into_iter().map(ApiCommit::normalize).collect();
        commits.sort_by(|a, b| b.date.cmp(&a.date));
        commits.truncate(limit);
        Ok(commits)
    }

    /// Fetch the unified diff for one commit.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the API call fails.
    pub async fn fetch_diff(&self, github_url: &str, commit_hash: &str) -> Result<String> {
        let (owner, repo) = Self::parse_repo_url(github_url)?;
        let url = format!(
            "{}/repos/{owner}/{repo}/commits/{commit_hash}",
            self.api_base
        );
        let response = Self::check(self.get(url, ACCEPT_DIFF).send().await?).await?;
        Ok(response.text().await?)
    }

    /// Resolve the repository's default branch.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the API call fails.
    pub async fn default_branch(&self, github_url: &str) -> Result<String> {
        let (owner, repo) = Self::parse_repo_url(github_url)?;
        let url = format!("{}/repos/{owner}/{repo}", self.api_base);
        let response = Self::check(self.get(url, ACCEPT_JSON).send().await?).await?;
        let info: RepoInfo = response.json().await?;
        Ok(info.default_branch)
    }

    /// Walk the recursive git tree of the default branch, yielding blobs that
    /// pass the crawl ignore rules.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the API call fails.
    pub async fn crawl_tree(&self, github_url: &str) -> Result<Vec<TreeEntry>> {
        let branch = self.default_branch(github_url).await?;
        let (owner, repo) = Self::parse_repo_url(github_url)?;
        let url = format!(
            "{}/repos/{owner}/{repo}/git/trees/{branch}?recursive=1",
            self.api_base
        );
        let response = Self::check(self.get(url, ACCEPT_JSON).send().await?).await?;
        let tree: ApiTree = response.json().await?;

        if tree.truncated {
            tracing::warn!(repo = %format!("{owner}/{repo}"), "tree listing truncated by the API");
        }

        Ok(tree
            .tree
            .into_iter()
            .filter(|node| node.node_type == "blob" && !is_ignored(&node.path))
            .map(|node| TreeEntry {
                path: node.path,
                sha: node.sha,
                size: node.size.unwrap_or_default(),
            })
            .collect())
    }

    /// Fetch a blob and decode it as UTF-8 text.
    ///
    /// Returns `Ok(None)` for blobs that are too large or not valid UTF-8
    /// (binary content); these are skipped by callers, not treated as errors.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the API call fails.
    pub async fn blob_text(&self, github_url: &str, entry: &TreeEntry) -> Result<Option<String>> {
        if entry.size > MAX_BLOB_BYTES {
            tracing::warn!(path = %entry.path, size = entry.size, "skipping oversized blob");
            return Ok(None);
        }

        let (owner, repo) = Self::parse_repo_url(github_url)?;
        let url = format!("{}/repos/{owner}/{repo}/git/blobs/{}", self.api_base, entry.sha);
        let response = Self::check(self.get(url, ACCEPT_JSON).send().await?).await?;
        let blob: ApiBlob = response.json().await?;

        let raw: String = blob.content.split_whitespace().collect();
        let Ok(bytes) = BASE64.decode(raw) else {
            tracing::warn!(path = %entry.path, "skipping blob with undecodable content");
            return Ok(None);
        };
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(_) => {
                tracing::warn!(path = %entry.path, "skipping binary blob");
                Ok(None)
            }
        }
    }
}

#[derive(Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetail,
    #[serde(default)]
    author: Option<ApiUser>,
}

#[derive(Deserialize)]
struct ApiCommitDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    author: Option<ApiCommitAuthor>,
}

#[derive(Deserialize)]
struct ApiCommitAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ApiUser {
    #[serde(default)]
    avatar_url: String,
}

impl ApiCommit {
    fn normalize(self) -> RepoCommit {
        let author = self.commit.author.unwrap_or_else(|| ApiCommitAuthor {
            name: String::new(),
            date: None,
        });
        RepoCommit {
            hash: self.sha,
            message: self.commit.message,
            author_name: author.name,
            author_avatar: self.author.map(|u| u.avatar_url).unwrap_or_default(),
            date: author.date.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct ApiTree {
    #[serde(default)]
    tree: Vec<ApiTreeNode>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct ApiTreeNode {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Deserialize)]
struct ApiBlob {
    #[serde(default)]
    content: String,
}
