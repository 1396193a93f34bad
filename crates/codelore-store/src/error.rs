#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("insert error: {0}")]
    Insert(String),

    #[error("query error: {0}")]
    Query(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
