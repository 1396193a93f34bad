//! Ingestion, indexing, and retrieval pipeline over a GitHub repository.
//!
//! Three entry points, consumed by the surrounding application layer:
//! [`CommitSync::sync_commits`], [`RepoIndexer::index_repository`], and
//! [`AnswerEngine::answer`]. The write path (sync + indexing) and the read
//! path (retrieval + answering) are independent; answers run against
//! whatever is currently indexed.

pub mod answer;
pub mod config;
pub mod error;
pub mod indexer;
pub mod project;
pub mod prompts;
pub mod sync;

pub use answer::{AnswerConfig, AnswerEngine, AnswerEvent, AnswerStream};
pub use config::Config;
pub use error::CoreError;
pub use indexer::{IndexConfig, IndexReport, RepoIndexer};
pub use project::{OnboardReport, onboard_project};
pub use sync::{CommitSync, SyncConfig};
