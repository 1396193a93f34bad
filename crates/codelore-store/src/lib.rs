//! Data model and persistence contract for the codelore pipeline.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::ProjectStore;
pub use types::{
    CommitRecord, FileReference, Project, Question, RankedFile, SourceFileEmbedding,
};
