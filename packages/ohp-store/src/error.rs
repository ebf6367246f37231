//! Error types for `ohp-store`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by the Store. Per spec, Store failures are fatal to the
/// calling worker: there is no silent state divergence.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("file not found: {0}")]
    FileNotFound(uuid::Uuid),

    #[error("stage status not found for file {file_id} stage {stage}")]
    StatusNotFound { file_id: uuid::Uuid, stage: String },

    #[error("invalid stage transition for {stage}: {from} -> {to}")]
    InvalidTransition {
        stage: String,
        from: String,
        to: String,
    },

    #[error("artifact hash mismatch for {path}: expected {expected}, got {actual}")]
    ArtifactHashMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("attempted to claim stage {stage} for file {file_id} whose prerequisite is not satisfied")]
    PrerequisiteMissing { file_id: uuid::Uuid, stage: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn serialization<E: std::fmt::Display>(e: E) -> Self {
        Self::Serialization(e.to_string())
    }
}
