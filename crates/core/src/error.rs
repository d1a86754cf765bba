//! Error types for content chunking and summarization.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, chunking, or summarizing content.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The content list is not valid JSON or has the wrong shape.
    #[error("Content list error: {0}")]
    ContentListError(String),

    /// The summarization backend failed for one item.
    #[error("Summarization error: {0}")]
    SummarizerError(String),

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ContentListError(err.to_string())
    }
}
