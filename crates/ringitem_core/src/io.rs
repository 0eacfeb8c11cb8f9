//! Moving records across a transport.
//!
//! Records are read header first: the size field says how many more bytes
//! belong to the record, and exactly those are read into the record's own
//! storage. A source that ends cleanly between records yields `None`; one
//! that ends part way through a record is an error.

use crate::buffer::RecordBuffer;
use crate::config::ReaderConfig;
use crate::error::{RecordError, RecordResult};
use crate::factory::RingItemFactory;
use crate::frame::Frame;
use crate::item::RingItem;
use crate::selector::{select_factory, select_factory_for_major};
use ringitem_format::item_type::RING_FORMAT;
use ringitem_format::{format_declaration_version, FormatVersion, RecordHeader, HEADER_SIZE};
use ringitem_transport::{RecordSink, RecordSource, TransportError};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Reads one record's bytes from `source` into storage sized for
/// `version`.
///
/// # Errors
///
/// - [`RecordError::Transport`] if the source fails or ends mid-record
/// - [`RecordError::Malformed`] if the declared size is below the
///   generation's minimum or above `config.max_record_size`
fn read_buffer(
    version: FormatVersion,
    source: &mut dyn RecordSource,
    config: &ReaderConfig,
) -> RecordResult<Option<RecordBuffer>> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    let got = source.read_fully(&mut header_bytes)?;
    if got == 0 {
        return Ok(None);
    }
    if got < HEADER_SIZE {
        return Err(TransportError::UnexpectedEof {
            expected: HEADER_SIZE,
            actual: got,
        }
        .into());
    }

    let header = RecordHeader::decode(&header_bytes)?;
    let size = match Frame::checked_size(version, header.size) {
        Ok(size) if size <= config.max_record_size => size,
        Ok(size) => {
            warn!(
                size,
                limit = config.max_record_size,
                item_type = header.item_type,
                "rejecting oversized record"
            );
            return Err(RecordError::malformed(format!(
                "declared size {size} exceeds the limit of {}",
                config.max_record_size
            )));
        }
        Err(e) => {
            warn!(size = header.size, item_type = header.item_type, "rejecting undersized record");
            return Err(e);
        }
    };

    let mut buffer = RecordBuffer::with_capacity(size + version.max_body_header_size());
    buffer.put_bytes(&header_bytes)?;
    source.read_exact_bytes(buffer.claim_slice(size - HEADER_SIZE)?)?;
    trace!(size, item_type = header.item_type, %version, "record read");
    Ok(Some(buffer))
}

/// Reads one record from `source` and parses its body header region.
pub(crate) fn read_frame(
    version: FormatVersion,
    source: &mut dyn RecordSource,
    config: &ReaderConfig,
) -> RecordResult<Option<Frame>> {
    match read_buffer(version, source, config)? {
        Some(buffer) => Frame::from_buffer(version, buffer).map(Some),
        None => Ok(None),
    }
}

/// Writes `item` to `sink` and flushes it.
///
/// # Errors
///
/// Returns [`RecordError::Transport`] if the sink fails or closes.
pub fn write_record(item: &dyn RingItem, sink: &mut dyn RecordSink) -> RecordResult<()> {
    sink.write_fully(item.as_bytes())?;
    sink.flush_sink().map_err(TransportError::from)?;
    trace!(size = item.size(), item_type = item.item_type(), "record written");
    Ok(())
}

/// Iterates the records of a source.
///
/// The stream starts with the factory for an initial generation and
/// switches whenever it reads a format declaration, so a file that
/// announces its format can be read without knowing it in advance. The
/// declaration itself is parsed under the generation it announces.
/// Iteration stops after the first error.
///
/// # Example
///
/// ```rust
/// use ringitem_core::{select_factory, FormatVersion, RecordStream};
///
/// let factory = select_factory(FormatVersion::V12);
/// let declaration = factory.make_data_format().unwrap();
///
/// let mut wire = Vec::new();
/// factory.put_ring_item(declaration.as_ring_item(), &mut wire).unwrap();
///
/// let records: Vec<_> = RecordStream::new(std::io::Cursor::new(wire), FormatVersion::V10)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub struct RecordStream<S: RecordSource> {
    source: S,
    factory: Arc<dyn RingItemFactory>,
    config: ReaderConfig,
    finished: bool,
}

impl<S: RecordSource> RecordStream<S> {
    /// Streams `source`, assuming `version` until told otherwise.
    pub fn new(source: S, version: FormatVersion) -> Self {
        Self {
            source,
            factory: select_factory(version),
            config: ReaderConfig::default(),
            finished: false,
        }
    }

    /// Replaces the reader configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// The generation records are currently read as.
    pub fn version(&self) -> FormatVersion {
        self.factory.version()
    }

    /// Gives back the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn follow_declaration(&mut self, record: &[u8]) -> RecordResult<()> {
        let (major, _minor) = format_declaration_version(record)?;
        let factory = select_factory_for_major(u32::from(major))?;
        if factory.version() != self.factory.version() {
            debug!(from = %self.factory.version(), to = %factory.version(), "switching record format");
            self.factory = factory;
        }
        Ok(())
    }

    fn read_next(&mut self) -> RecordResult<Option<Box<dyn RingItem>>> {
        let Some(buffer) = read_buffer(self.factory.version(), &mut self.source, &self.config)?
        else {
            return Ok(None);
        };
        // A declaration is parsed under the generation it announces.
        if RecordHeader::decode(buffer.as_bytes())?.item_type == RING_FORMAT {
            self.follow_declaration(buffer.as_bytes())?;
        }
        let frame = Frame::from_buffer(self.factory.version(), buffer)?;
        self.factory.ring_item_from_frame(frame, &self.config).map(Some)
    }
}

impl<S: RecordSource> Iterator for RecordStream<S> {
    type Item = RecordResult<Box<dyn RingItem>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
