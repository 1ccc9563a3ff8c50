use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input folder does not exist: {path}")]
    MissingInput { path: String },

    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidLogFilter { filter: String, reason: String },

    #[error("{failed} of {total} chapters failed")]
    BatchFailures { failed: usize, total: usize },

    #[error(transparent)]
    Stitch(#[from] stripcut::Error),
}
