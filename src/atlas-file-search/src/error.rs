//! Error types for file search operations.

/// Result type alias for file search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during file search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The engine has not been initialized yet.
    #[error("search engine has not been initialized. Call initialize() first.")]
    NotInitialized,

    /// The search was aborted through its cancellation token.
    #[error("search was cancelled")]
    Cancelled,

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Returns true when this error is the cancellation condition.
    ///
    /// Callers branch on this to silently discard a superseded query
    /// instead of reporting a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
