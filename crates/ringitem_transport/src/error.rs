//! Error types for transport operations.

use std::io;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while moving bytes to or from a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended part way through a record.
    #[error("stream ended mid-record: expected {expected} bytes, got {actual}")]
    UnexpectedEof {
        /// Bytes requested.
        expected: usize,
        /// Bytes received before the stream ended.
        actual: usize,
    },

    /// The sink accepted no bytes and will accept no more.
    #[error("transport is closed")]
    Closed,
}
