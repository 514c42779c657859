//! Error types for `hummingbird-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A resolution name other than `high`, `medium` or `low`.
    #[error("invalid resolution: {0} (expected high, medium or low)")]
    InvalidResolution(String),

    /// A stored password digest that is neither SHA-512 hex nor an Argon2 PHC string.
    #[error("invalid password digest: {0}")]
    InvalidDigest(String),

    /// The frame source failed to produce an image.
    #[error("capture failed: {0}")]
    Capture(String),

    /// A session token could not be created.
    #[error("token error: {0}")]
    Token(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `hummingbird-core`.
pub type CoreResult<T> = Result<T, CoreError>;
