//! # Ring Item Format
//!
//! Binary layout descriptors for data-acquisition ring items.
//!
//! A ring item is a self-describing record:
//!
//! ```text
//! | size (4) | type (4) | body header slot (v11+) | body (N) |
//! ```
//!
//! All integers are little-endian and fields are packed with no padding.
//! This crate knows the layouts of each protocol generation (v10, v11,
//! v12) but does not own buffers or perform I/O.
//!
//! ## Usage
//!
//! ```
//! use ringitem_format::{locate_body, FormatVersion, RecordHeader};
//!
//! let mut record = RecordHeader { size: 12, item_type: 30 }.encode().to_vec();
//! record.extend_from_slice(&4u32.to_le_bytes());
//!
//! let location = locate_body(FormatVersion::V12, &record).unwrap();
//! assert_eq!(location.body_offset, 12);
//! assert!(location.body_header.is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod header;
pub mod item_type;
pub mod layout;
mod reader;
mod version;

pub use error::{FormatError, FormatResult};
pub use header::{
    format_declaration_version, locate_body, BodyHeader, BodyLocation, RecordHeader,
    BODY_HEADER_MARKER_SIZE, BODY_HEADER_SIZE, HEADER_SIZE,
};
pub use layout::{BodyLayouts, TITLE_FIELD_SIZE, TITLE_MAXSIZE};
pub use reader::{u16_at, u32_at, u64_at, ByteReader};
pub use version::FormatVersion;
