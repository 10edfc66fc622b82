//! Error types for feedwatch.

use thiserror::Error;

/// Common error type for feedwatch.
#[derive(Error, Debug)]
pub enum FeedwatchError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    ///
    /// Raised at startup only; the process exits before entering the run loop.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid notifier specification.
    #[error("notifier error: {0}")]
    Notifier(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// Network or HTTP error while fetching a feed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Feed document could not be parsed.
    #[error("feed error: {0}")]
    Feed(String),

    /// Both diff strategies failed.
    #[error("diff error: {0}")]
    Diff(#[from] crate::diff::DiffError),

    /// Filesystem watch error.
    #[error("watch error: {0}")]
    Watch(String),
}

impl From<notify::Error> for FeedwatchError {
    fn from(e: notify::Error) -> Self {
        FeedwatchError::Watch(e.to_string())
    }
}

/// Result type alias for feedwatch operations.
pub type Result<T> = std::result::Result<T, FeedwatchError>;
