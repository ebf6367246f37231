//! Scheduler-facing fatal error type. Distinct from `ohp_store::StorageError`
//! (the durable-state boundary) and `ohp_providers::ProviderError` (the
//! vendor boundary): recoverable provider/segment errors are matched
//! explicitly by workers and recorded via `Store::fail`, never propagated
//! here. Only failures that make continued scheduling unsafe do.

use thiserror::Error;
use uuid::Uuid;

/// Terminates the scheduler. Per §7: "Fatal errors (`artifact_hash_mismatch`,
/// `prerequisite_missing`, Store unavailability) terminate the scheduler
/// with a non-zero exit code."
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("store error: {0}")]
    Store(#[from] ohp_store::StorageError),

    #[error("artifact hash mismatch for {path}: expected {expected}, got {actual}")]
    ArtifactHashMismatch { path: String, expected: String, actual: String },

    #[error("attempted to claim stage for file {file_id} whose prerequisite is unmet")]
    PrerequisiteMissing { file_id: Uuid },

    #[error("io error: {0}")]
    Io(String),
}

impl From<ohp_artifacts::ArtifactError> for FatalError {
    fn from(e: ohp_artifacts::ArtifactError) -> Self {
        match e {
            ohp_artifacts::ArtifactError::HashMismatch { path, expected, actual } => {
                FatalError::ArtifactHashMismatch { path, expected, actual }
            }
            other => FatalError::Io(other.to_string()),
        }
    }
}

impl FatalError {
    /// Process exit code per §6: 3 for store unavailability, 4 for any
    /// other fatal internal inconsistency.
    pub fn exit_code(&self) -> i32 {
        match self {
            FatalError::Store(_) => 3,
            _ => 4,
        }
    }
}
