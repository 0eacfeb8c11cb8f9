//! Protocol generations and the major-version lookup table.

use crate::error::{FormatError, FormatResult};
use crate::header::{BODY_HEADER_MARKER_SIZE, BODY_HEADER_SIZE, HEADER_SIZE};
use std::fmt;

/// A ring item protocol generation.
///
/// The generation fixes the byte layout of every record kind. It is not
/// stored in ordinary records; streams announce it with a format
/// declaration record (v11 onwards) or it is known out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatVersion {
    /// The earliest generation. No body headers, no format declarations.
    V10,
    /// Adds optional body headers, offset divisors and format declarations.
    V11,
    /// Adds original source ids and extensible body headers.
    V12,
}

/// Maps the major number carried by a format declaration to a generation.
const VERSION_TABLE: [(u32, FormatVersion); 3] = [
    (10, FormatVersion::V10),
    (11, FormatVersion::V11),
    (12, FormatVersion::V12),
];

impl FormatVersion {
    /// Every known generation, oldest first.
    pub const ALL: [FormatVersion; 3] = [Self::V10, Self::V11, Self::V12];

    /// Translates a major version number into a generation.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnknownVersion`] if the number is not in the
    /// lookup table.
    pub fn from_major(major: u32) -> FormatResult<Self> {
        VERSION_TABLE
            .iter()
            .find(|(number, _)| *number == major)
            .map(|(_, version)| *version)
            .ok_or(FormatError::UnknownVersion { major })
    }

    /// Major version number written into format declarations.
    #[must_use]
    pub const fn major(self) -> u16 {
        match self {
            Self::V10 => 10,
            Self::V11 => 11,
            Self::V12 => 12,
        }
    }

    /// Minor version number written into format declarations.
    #[must_use]
    pub const fn minor(self) -> u16 {
        0
    }

    /// Whether records of this generation can carry a body header.
    #[must_use]
    pub const fn supports_body_headers(self) -> bool {
        !matches!(self, Self::V10)
    }

    /// Whether abnormal-end, format declaration and glom items exist.
    #[must_use]
    pub const fn supports_format_items(self) -> bool {
        !matches!(self, Self::V10)
    }

    /// Value stored in the body header slot when no body header is present.
    #[must_use]
    pub const fn empty_body_header_marker(self) -> Option<u32> {
        match self {
            Self::V10 => None,
            Self::V11 => Some(0),
            Self::V12 => Some(BODY_HEADER_MARKER_SIZE as u32),
        }
    }

    /// Smallest valid record: the header plus an empty body header slot.
    #[must_use]
    pub const fn min_record_size(self) -> usize {
        if self.supports_body_headers() {
            HEADER_SIZE + BODY_HEADER_MARKER_SIZE
        } else {
            HEADER_SIZE
        }
    }

    /// Bytes to reserve so a body header can always be written.
    #[must_use]
    pub const fn max_body_header_size(self) -> usize {
        if self.supports_body_headers() {
            BODY_HEADER_SIZE
        } else {
            0
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_roundtrip() {
        for version in FormatVersion::ALL {
            let major = u32::from(version.major());
            assert_eq!(FormatVersion::from_major(major).unwrap(), version);
        }
    }

    #[test]
    fn unknown_major_rejected() {
        assert_eq!(
            FormatVersion::from_major(13),
            Err(FormatError::UnknownVersion { major: 13 })
        );
        assert!(FormatVersion::from_major(0).is_err());
    }

    #[test]
    fn empty_markers_differ_by_generation() {
        assert_eq!(FormatVersion::V10.empty_body_header_marker(), None);
        assert_eq!(FormatVersion::V11.empty_body_header_marker(), Some(0));
        assert_eq!(FormatVersion::V12.empty_body_header_marker(), Some(4));
    }

    #[test]
    fn display() {
        assert_eq!(FormatVersion::V11.to_string(), "v11");
    }
}
