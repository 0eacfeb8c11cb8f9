//! The common record interface and the generic record type.

use crate::error::{RecordError, RecordResult};
use crate::frame::Frame;
use crate::wire::WireFormat;
use ringitem_format::{item_type, BodyHeader, FormatVersion};
use std::fmt::{self, Write as _};
use std::marker::PhantomData;

/// One self-describing record, whatever its kind or generation.
///
/// Implementors supply access to their [`Frame`]; everything else has a
/// default that works on the raw bytes. Kind-specific types override
/// [`RingItem::describe`] and, where their kind has special body header
/// rules, the body header methods.
pub trait RingItem: fmt::Debug + Send + Sync {
    /// The record's storage.
    fn frame(&self) -> &Frame;

    /// Mutable access to the record's storage.
    fn frame_mut(&mut self) -> &mut Frame;

    /// Protocol generation of the record.
    fn version(&self) -> FormatVersion {
        self.frame().version()
    }

    /// Item type code.
    fn item_type(&self) -> u32 {
        self.frame().item_type()
    }

    /// Record size from the header.
    fn size(&self) -> u32 {
        self.frame().size()
    }

    /// The record's bytes, header included.
    fn as_bytes(&self) -> &[u8] {
        self.frame().as_bytes()
    }

    /// Whether the record was produced on a host of the other byte order.
    fn must_swap(&self) -> bool {
        self.frame().header().must_swap()
    }

    /// Whether the record carries a body header.
    fn has_body_header(&self) -> bool {
        self.frame().has_body_header()
    }

    /// The body header, if the record carries one.
    fn body_header(&self) -> Option<BodyHeader> {
        self.frame().body_header()
    }

    /// Stamps the record with a body header.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::NoBodyHeader`] when the record cannot
    /// carry one.
    fn set_body_header(&mut self, header: BodyHeader) -> RecordResult<()> {
        self.frame_mut().set_body_header(header)
    }

    /// The body bytes.
    fn body(&self) -> &[u8] {
        self.frame().body()
    }

    /// Offset of the body from the start of the record.
    fn body_offset(&self) -> usize {
        self.frame().body_offset()
    }

    /// Offset of the write cursor from the start of the record.
    fn body_cursor(&self) -> usize {
        self.frame().cursor()
    }

    /// Body bytes laid out by the record's kind.
    ///
    /// Generic records and physics events have none; other kinds report
    /// the end of their last field.
    fn fixed_body_size(&self) -> usize {
        0
    }

    /// Moves the write cursor. Call [`RingItem::update_size`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if `position` would cut
    /// into the kind's fields, or an error if it is outside the body's
    /// storage.
    fn set_body_cursor(&mut self, position: usize) -> RecordResult<()> {
        let floor = self.body_offset() + self.fixed_body_size();
        if position < floor {
            return Err(RecordError::invalid_argument(format!(
                "cursor {position} cuts into the {} fields ending at {floor}",
                self.type_name()
            )));
        }
        self.frame_mut().set_cursor(position)
    }

    /// Appends bytes to the body and updates the size field.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::CapacityExceeded`] if the bytes do not
    /// fit in the record's fixed storage.
    fn append_body(&mut self, data: &[u8]) -> RecordResult<()> {
        self.frame_mut().append(data)
    }

    /// Stores the cursor position in the size field.
    fn update_size(&mut self) {
        self.frame_mut().update_size();
    }

    /// Human readable name of the record's kind.
    fn type_name(&self) -> String {
        item_type::name(self.item_type())
    }

    /// Multi-line dump of the record.
    ///
    /// The default shows the header and a hex table of the body.
    fn describe(&self) -> String {
        let mut out = describe_header(self);
        out.push_str(&hex_dump(self.body()));
        out
    }
}

/// Borrow any record as `&dyn RingItem`.
///
/// Implemented for every sized [`RingItem`]; kind traits list it as a
/// supertrait so their trait objects can be passed where a plain record is
/// expected.
pub trait AsRingItem {
    /// The record as a plain [`RingItem`].
    fn as_ring_item(&self) -> &dyn RingItem;
}

impl<T: RingItem> AsRingItem for T {
    fn as_ring_item(&self) -> &dyn RingItem {
        self
    }
}

impl PartialEq for dyn RingItem + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Display for dyn RingItem + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Header lines shared by every record dump.
pub(crate) fn describe_header<R: RingItem + ?Sized>(item: &R) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}, format {}", item.type_name(), item.version());
    let _ = writeln!(out, "Size: {} bytes, type: {}", item.size(), item.item_type());
    match item.body_header() {
        Some(header) => {
            let _ = writeln!(
                out,
                "Body header: timestamp {} source id {} barrier type {}",
                header.timestamp, header.source_id, header.barrier_type
            );
        }
        None => out.push_str("No body header\n"),
    }
    out
}

/// Hex table of `bytes`, sixteen to a row.
pub(crate) fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3 + bytes.len() / 16 * 10);
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}:", row * 16);
        for byte in chunk {
            let _ = write!(out, " {byte:02x}");
        }
        out.push('\n');
    }
    out
}

/// A record of any type without a kind-specific view.
///
/// Used for physics events built byte by byte, user item codes, and as
/// the starting point for reinterpreting bytes as a specific kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericItem<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> GenericItem<F> {
    /// Creates an empty record of `item_type` with room for `max_body`
    /// body bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the capacity cannot be represented.
    pub fn new(item_type: u32, max_body: usize) -> RecordResult<Self> {
        Frame::new(F::VERSION, item_type, max_body).map(Self::from_frame)
    }

    /// Creates an empty record stamped with a body header.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::NoBodyHeader`] for v10.
    pub fn with_body_header(item_type: u32, header: BodyHeader, max_body: usize) -> RecordResult<Self> {
        Frame::with_body_header(F::VERSION, item_type, header, max_body).map(Self::from_frame)
    }

    /// Copies a complete record out of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::Malformed`] if the declared size is
    /// inconsistent with `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> RecordResult<Self> {
        Frame::from_bytes(F::VERSION, bytes).map(Self::from_frame)
    }

    pub(crate) fn from_frame(frame: Frame) -> Self {
        Self {
            frame,
            _format: PhantomData,
        }
    }
}

impl<F: WireFormat> RingItem for GenericItem<F> {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{V10, V11, V12};
    use ringitem_format::item_type::{FIRST_USER_ITEM_CODE, PHYSICS_EVENT};

    #[test]
    fn generic_append_updates_size() {
        let mut item = GenericItem::<V12>::new(PHYSICS_EVENT, 64).unwrap();
        assert_eq!(item.size(), 12);
        item.append_body(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(item.size(), 18);
        assert_eq!(item.body(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(item.body_cursor(), 18);
        assert_eq!(item.body_offset(), 12);
    }

    #[test]
    fn generic_cursor_rewinds_to_body_start() {
        let mut item = GenericItem::<V11>::new(PHYSICS_EVENT, 8).unwrap();
        item.append_body(&[1, 2, 3]).unwrap();
        let start = item.body_offset();
        item.set_body_cursor(start + 1).unwrap();
        item.update_size();
        assert_eq!(item.body(), &[1]);
        item.set_body_cursor(start).unwrap();
        item.update_size();
        assert!(item.body().is_empty());
    }

    #[test]
    fn equality_is_bytewise() {
        let mut a = GenericItem::<V11>::new(PHYSICS_EVENT, 8).unwrap();
        let mut b = GenericItem::<V11>::new(PHYSICS_EVENT, 64).unwrap();
        a.append_body(&[1, 2]).unwrap();
        b.append_body(&[1, 2]).unwrap();
        assert!(a.as_ring_item() == b.as_ring_item());
        b.append_body(&[3]).unwrap();
        assert!(a.as_ring_item() != b.as_ring_item());
    }

    #[test]
    fn clone_is_deep() {
        let mut original = GenericItem::<V10>::new(PHYSICS_EVENT, 8).unwrap();
        original.append_body(&[1]).unwrap();
        let mut copy = original.clone();
        copy.append_body(&[2]).unwrap();
        assert_eq!(original.body(), &[1]);
        assert_eq!(copy.body(), &[1, 2]);
    }

    #[test]
    fn body_header_roundtrip() {
        let mut item = GenericItem::<V12>::new(PHYSICS_EVENT, 8).unwrap();
        assert!(!item.has_body_header());
        let header = BodyHeader::new(123_456_789, 3, 0);
        item.set_body_header(header).unwrap();
        assert!(item.has_body_header());
        assert_eq!(item.body_header(), Some(header));
    }

    #[test]
    fn v10_body_header_is_rejected() {
        let mut item = GenericItem::<V10>::new(PHYSICS_EVENT, 8).unwrap();
        assert!(matches!(
            item.set_body_header(BodyHeader::default()),
            Err(RecordError::NoBodyHeader { .. })
        ));
        assert!(GenericItem::<V10>::with_body_header(PHYSICS_EVENT, BodyHeader::default(), 0).is_err());
    }

    #[test]
    fn must_swap_detects_foreign_order() {
        let native = GenericItem::<V11>::new(PHYSICS_EVENT, 0).unwrap();
        assert!(!native.must_swap());
        let foreign = GenericItem::<V11>::new(PHYSICS_EVENT << 16, 0).unwrap();
        assert!(foreign.must_swap());
    }

    #[test]
    fn describe_shows_hex_table() {
        let mut item = GenericItem::<V11>::new(FIRST_USER_ITEM_CODE, 32).unwrap();
        item.append_body(&(0u8..18).collect::<Vec<_>>()).unwrap();
        let text = item.describe();
        assert!(text.starts_with("User item (32768), format v11\n"));
        assert!(text.contains("No body header"));
        assert!(text.contains("00000000: 00 01 02"));
        assert!(text.contains("00000010: 10 11\n"));
        assert_eq!(format!("{}", item.as_ring_item()), text);
    }
}
