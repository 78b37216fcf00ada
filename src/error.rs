use thiserror::Error;

use crate::builder::BuilderInvalidReason;

/// Result type of every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, HeyawakeError>;

/// Failures of loading, building or solving a board.
#[derive(Debug, Error)]
pub enum HeyawakeError {
    /// Reading or writing a template file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A template file was not valid template JSON.
    #[error("template JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A template parsed but does not describe a board.
    #[error("invalid template: {0}")]
    Template(String),

    /// The builder ended in an invalid state.
    #[error("board could not be built: {0:?}")]
    Builder(Vec<BuilderInvalidReason>),

    /// The SAT engine itself reported an error.
    #[error("SAT backend failed: {0}")]
    Backend(String),
}

impl From<Vec<BuilderInvalidReason>> for HeyawakeError {
    fn from(reasons: Vec<BuilderInvalidReason>) -> Self {
        HeyawakeError::Builder(reasons)
    }
}
