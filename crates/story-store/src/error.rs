/// Errors from account store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A damaged record sits before the end of the commit log. Later
    /// records cannot be trusted to follow it, so nothing is discarded.
    #[error("commit log corrupt at byte {offset}")]
    Corrupt { offset: u64 },

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
