use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArtifactError>;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("io error writing artifact at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Post-write read-back hash differs from what was just written. Fatal
    /// per spec: the scheduler terminates rather than recording a completed
    /// stage backed by corrupt bytes.
    #[error("artifact hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}
