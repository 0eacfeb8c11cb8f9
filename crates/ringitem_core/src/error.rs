//! Error types for ring item records and factories.

use ringitem_format::{FormatError, FormatVersion};
use ringitem_transport::TransportError;
use thiserror::Error;

/// Result type for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors that can occur while building, viewing or moving records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Fixed layout decoding failed.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Moving bytes to or from a transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A typed view was requested over a record of a different kind.
    #[error("wrong item type: expected {expected}, got {actual}")]
    WrongKind {
        /// Description of the accepted type codes.
        expected: String,
        /// The record's actual type code.
        actual: u32,
    },

    /// A body header operation on a record that cannot carry one.
    #[error("item type {item_type} has no body header")]
    NoBodyHeader {
        /// The record's type code.
        item_type: u32,
    },

    /// A second attempt to stamp an event builder fragment.
    #[error("event fragment already carries a body header")]
    FragmentAlreadyStamped,

    /// Indexed access past the end of a collection.
    #[error("index {index} out of range for {count} entries")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of entries.
        count: usize,
    },

    /// Content does not fit in the record's storage.
    #[error("capacity exceeded: need {required} bytes, {available} available")]
    CapacityExceeded {
        /// Bytes required.
        required: usize,
        /// Bytes available.
        available: usize,
    },

    /// A version number with no known protocol generation.
    #[error("unrecognized format version: {major}")]
    InvalidVersion {
        /// The version number that was looked up.
        major: u32,
    },

    /// The protocol generation does not define this kind of record.
    #[error("{kind} items are not supported by format {version}")]
    Unsupported {
        /// The generation asked to build the record.
        version: FormatVersion,
        /// The kind of record requested.
        kind: &'static str,
    },

    /// A run state change with a reason other than begin/end/pause/resume.
    #[error("invalid state transition code: {code}")]
    InvalidTransition {
        /// The rejected type code.
        code: u32,
    },

    /// An argument the requested layout cannot represent.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// Raw bytes that do not form a valid record of the expected kind.
    #[error("malformed record: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
    },
}

impl RecordError {
    /// Creates a wrong kind error.
    pub fn wrong_kind(expected: impl Into<String>, actual: u32) -> Self {
        Self::WrongKind {
            expected: expected.into(),
            actual,
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a malformed record error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates an unsupported kind error.
    pub fn unsupported(version: FormatVersion, kind: &'static str) -> Self {
        Self::Unsupported { version, kind }
    }

    /// Creates a capacity exceeded error.
    pub fn capacity_exceeded(required: usize, available: usize) -> Self {
        Self::CapacityExceeded {
            required,
            available,
        }
    }
}
