//! # Ring Item Testkit
//!
//! Test utilities for ring item records.
//!
//! This crate provides:
//! - Fixtures: deterministic sample records for every generation and
//!   temporary event files
//! - Property-based test generators using proptest
//! - Hand-checked byte vectors for wire layout verification
//!
//! Cross-crate scenarios live in this crate's `tests/` directory.
//!
//! ## Usage
//!
//! ```rust
//! use ringitem_testkit::prelude::*;
//! use ringitem_core::{select_factory, FormatVersion};
//!
//! let factory = select_factory(FormatVersion::V11);
//! let file = RecordFile::new();
//! let records = sample_records(factory.as_ref());
//! file.write_records(factory.as_ref(), &records);
//! assert_eq!(file.read_records(factory.as_ref()).len(), records.len());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
