use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External project entity; read-only input to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub github_url: Option<String>,
    pub github_token: Option<String>,
}

/// One summarized commit; append-only, created at most once per
/// `(project_id, commit_hash)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub project_id: String,
    pub commit_hash: String,
    pub commit_message: String,
    pub commit_author_name: String,
    pub commit_author_avatar: String,
    pub commit_date: DateTime<Utc>,
    /// AI-generated summary; empty when summarization degraded.
    pub summary: String,
}

/// One indexed file with its summary and embedding vector, keyed by
/// `(project_id, file_name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFileEmbedding {
    pub project_id: String,
    pub file_name: String,
    pub source_code: String,
    pub summary: String,
    pub embedding: Vec<f32>,
}

/// The `{ file_name, source_code, summary }` projection of an indexed file,
/// as referenced from answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub file_name: String,
    pub source_code: String,
    pub summary: String,
}

impl From<&SourceFileEmbedding> for FileReference {
    fn from(record: &SourceFileEmbedding) -> Self {
        Self {
            file_name: record.file_name.clone(),
            source_code: record.source_code.clone(),
            summary: record.summary.clone(),
        }
    }
}

/// Retrieval output: a referenced file with its cosine similarity to the
/// query, in `(0.0, 1.0]` above the caller's floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedFile {
    pub file: FileReference,
    pub similarity: f32,
}

/// A saved question/answer pair with its retrieved file references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub project_id: String,
    pub user_id: String,
    pub question: String,
    pub answer: String,
    pub file_references: Vec<FileReference>,
}
