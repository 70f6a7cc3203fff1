//! Error types for the gameshelf library and store.

/// Top-level error type for the game library.
#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    /// Library file could not be read, parsed or written.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A game or collection id did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// A value was rejected (rating out of range, duplicate name, ...).
    #[error("invalid input: {0}")]
    Invalid(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ShelfError>;
