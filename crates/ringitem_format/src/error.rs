//! Error types for the format crate.

use thiserror::Error;

/// Result type for layout decoding.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while decoding fixed record layouts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A field extends past the end of the available bytes.
    #[error("unexpected end of data: need {needed} bytes at offset {offset}, {available} available")]
    UnexpectedEof {
        /// Offset of the field being decoded.
        offset: usize,
        /// Bytes required by the field.
        needed: usize,
        /// Total bytes available.
        available: usize,
    },

    /// The bytes do not describe a well-formed record.
    #[error("invalid record structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// A major version number with no known protocol generation.
    #[error("unknown format major version: {major}")]
    UnknownVersion {
        /// The major version number that was looked up.
        major: u32,
    },
}

impl FormatError {
    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unexpected end of data error.
    pub fn unexpected_eof(offset: usize, needed: usize, available: usize) -> Self {
        Self::UnexpectedEof {
            offset,
            needed,
            available,
        }
    }
}
