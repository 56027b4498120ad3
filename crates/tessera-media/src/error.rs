//! Error types for tessera-media.
//!
//! Backpressure ("no buffer", "sleeping") and end-of-stream are normal flow
//! control and are reported through status enums, never through `Error`.

use std::io;
use thiserror::Error;

/// Result type for tessera-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tessera-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on the underlying stream. Fatal, never retried internally.
    #[error("stream error: {0}")]
    Io(#[from] io::Error),

    /// Malformed movie data: bad magic, mandatory-chunk violation, size
    /// mismatch after decompression, or an unknown chunk inside a frame span.
    #[error("format error: {0}")]
    Format(String),

    /// Buffer configuration that cannot be satisfied at open time.
    #[error("resource error: {0}")]
    Resource(String),

    /// Valid but unsupported movie parameters (e.g. block geometry).
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a resource error.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
