//! Error types for the scAmp core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScampError>;

#[derive(Debug, Error)]
pub enum ScampError {
    /// Invalid hyperparameters or argument combinations, raised before any work starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model not trained: {0}")]
    NotTrained(String),

    /// Internal contract violation between aligned sequences or tensors
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Model persistence error: {0}")]
    Persistence(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScampError {
    pub fn shape_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        ScampError::ShapeMismatch(format!(
            "{}: expected {}, got {}",
            what, expected, actual
        ))
    }
}
