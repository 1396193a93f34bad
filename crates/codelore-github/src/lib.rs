//! GitHub REST client: commit metadata, unified diffs, repository tree crawl.

pub mod client;
pub mod crawl;
pub mod error;

pub use client::{GithubClient, RepoCommit, TreeEntry};
pub use error::GithubError;
