//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Memory mapping error.
    #[error("memory mapping error: {0}")]
    MmapError(String),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core library error.
    #[error("{0}")]
    CoreError(#[from] hitgrid_core::Error),
}

impl Error {
    /// Operator-facing label for the class of failure.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Error::CoreError(e) => e.kind().label(),
            Error::InvalidFormat(_) => hitgrid_core::ErrorKind::Data.label(),
            Error::Io(_) | Error::MmapError(_) | Error::Json(_) => "I/O failure",
        }
    }
}
