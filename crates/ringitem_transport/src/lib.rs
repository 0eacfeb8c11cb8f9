//! # Ring Item Transport
//!
//! Byte source and sink seams for moving ring items.
//!
//! This crate is the narrowest possible stand-in for a data-acquisition
//! transport. Sources and sinks are **opaque byte streams** - they do not
//! interpret the records flowing through them.
//!
//! ## Design Principles
//!
//! - Any `Read + Send` is a [`RecordSource`], any `Write + Send` a
//!   [`RecordSink`]
//! - Interrupted and would-block conditions are retried here, not by the
//!   record layer
//! - A stream that ends part way through a request is a hard error
//!
//! ## Available Transports
//!
//! - [`MemoryRing`] - Bounded in-memory ring with producer/consumer handles
//! - [`FileSource`] / [`FileSink`] - Event files

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod sink;
mod source;

pub use error::{TransportError, TransportResult};
pub use file::{FileSink, FileSource};
pub use memory::{MemoryRing, RingConsumer, RingProducer};
pub use sink::RecordSink;
pub use source::RecordSource;
