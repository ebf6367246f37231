use thiserror::Error;

/// Top-level binary error, carrying the §6 process exit code alongside the
/// human-readable cause.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("store unavailable: {0}")]
    Store(#[from] ohp_store::StorageError),

    #[error(transparent)]
    Fatal(#[from] ohp_pipeline::FatalError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Store(_) => 3,
            CliError::Fatal(e) => e.exit_code(),
        }
    }
}
