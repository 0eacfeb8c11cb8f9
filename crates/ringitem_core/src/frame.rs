//! Version-aware record framing.
//!
//! A [`Frame`] owns the bytes of one record and knows where its body
//! starts under the rules of its protocol generation:
//!
//! ```text
//! | size (4) | type (4) | body header slot (v11+) | body ... | free capacity |
//!                                                          ^ cursor
//! ```
//!
//! The size field always equals the cursor after [`Frame::update_size`].
//! The body never grows past the size declared when the record was built;
//! storage reserved for a later body header is not body space.

use crate::buffer::RecordBuffer;
use crate::error::{RecordError, RecordResult};
use ringitem_format::{
    locate_body, BodyHeader, FormatVersion, RecordHeader, BODY_HEADER_MARKER_SIZE,
    BODY_HEADER_SIZE, HEADER_SIZE,
};

/// Offset of the body header slot.
const SLOT_OFFSET: usize = HEADER_SIZE;

/// The owned bytes of one record under one protocol generation.
///
/// Two frames are equal when they hold the same bytes under the same
/// generation, whatever their spare capacity.
#[derive(Debug, Clone)]
pub struct Frame {
    version: FormatVersion,
    buffer: RecordBuffer,
    body_offset: usize,
    /// End of the writable body.
    limit: usize,
}

impl Frame {
    /// Creates an empty record of `item_type` with room for `max_body`
    /// body bytes and a body header added later.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CapacityExceeded`] if the record could not
    /// describe its own size.
    pub fn new(version: FormatVersion, item_type: u32, max_body: usize) -> RecordResult<Self> {
        let mut buffer = Self::allocate(version, max_body)?;
        buffer.put_u32(0)?;
        buffer.put_u32(item_type)?;
        if let Some(marker) = version.empty_body_header_marker() {
            buffer.put_u32(marker)?;
        }
        let body_offset = buffer.cursor();
        buffer.update_size();
        Ok(Self {
            version,
            buffer,
            body_offset,
            limit: body_offset + max_body,
        })
    }

    /// Creates an empty record of `item_type` stamped with `header`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NoBodyHeader`] if the generation has no body
    /// headers.
    pub fn with_body_header(
        version: FormatVersion,
        item_type: u32,
        header: BodyHeader,
        max_body: usize,
    ) -> RecordResult<Self> {
        if !version.supports_body_headers() {
            return Err(RecordError::NoBodyHeader { item_type });
        }
        let mut buffer = Self::allocate(version, max_body)?;
        buffer.put_u32(0)?;
        buffer.put_u32(item_type)?;
        buffer.put_bytes(&header.encode())?;
        let body_offset = buffer.cursor();
        buffer.update_size();
        Ok(Self {
            version,
            buffer,
            body_offset,
            limit: body_offset + max_body,
        })
    }

    /// Creates a record with or without a body header.
    pub fn build(
        version: FormatVersion,
        item_type: u32,
        header: Option<BodyHeader>,
        max_body: usize,
    ) -> RecordResult<Self> {
        match header {
            Some(header) => Self::with_body_header(version, item_type, header, max_body),
            None => Self::new(version, item_type, max_body),
        }
    }

    /// Copies a complete record out of `bytes`.
    ///
    /// Only the bytes covered by the declared size are copied; anything
    /// after them is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Malformed`] if the declared size is smaller
    /// than the generation's minimum or larger than `bytes`, and a format
    /// error if the body header slot is invalid.
    pub fn from_bytes(version: FormatVersion, bytes: &[u8]) -> RecordResult<Self> {
        let header = RecordHeader::decode(bytes)?;
        let size = Self::checked_size(version, header.size)?;
        if size > bytes.len() {
            return Err(RecordError::malformed(format!(
                "declared size {size} exceeds the {} bytes supplied",
                bytes.len()
            )));
        }
        let mut buffer = RecordBuffer::with_capacity(size + version.max_body_header_size());
        buffer.put_bytes(&bytes[..size])?;
        Self::from_buffer(version, buffer)
    }

    /// Validates a declared record size against the generation's minimum.
    pub(crate) fn checked_size(version: FormatVersion, declared: u32) -> RecordResult<usize> {
        let size = declared as usize;
        if size < version.min_record_size() {
            return Err(RecordError::malformed(format!(
                "declared size {size} is below the {version} minimum of {}",
                version.min_record_size()
            )));
        }
        Ok(size)
    }

    /// Wraps a buffer whose cursor sits at the end of a complete record.
    ///
    /// The record's body is full: nothing more can be appended.
    pub(crate) fn from_buffer(version: FormatVersion, buffer: RecordBuffer) -> RecordResult<Self> {
        let location = locate_body(version, buffer.as_bytes())?;
        let limit = buffer.cursor();
        Ok(Self {
            version,
            buffer,
            body_offset: location.body_offset,
            limit,
        })
    }

    fn allocate(version: FormatVersion, max_body: usize) -> RecordResult<RecordBuffer> {
        let fixed = HEADER_SIZE + version.max_body_header_size();
        let capacity = fixed
            .checked_add(max_body)
            .filter(|c| u32::try_from(*c).is_ok())
            .ok_or_else(|| RecordError::capacity_exceeded(max_body, u32::MAX as usize - fixed))?;
        Ok(RecordBuffer::with_capacity(capacity))
    }

    /// The protocol generation.
    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// The item type code.
    #[must_use]
    pub fn item_type(&self) -> u32 {
        self.buffer.u32_at(4).unwrap_or(0)
    }

    /// The size field as last written by [`Frame::update_size`].
    #[must_use]
    pub fn size(&self) -> u32 {
        self.buffer.u32_at(0).unwrap_or(0)
    }

    /// The record header.
    #[must_use]
    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            size: self.size(),
            item_type: self.item_type(),
        }
    }

    /// Bytes from the start of the record to the cursor.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Total storage, including room reserved for a body header.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Largest body the record can hold.
    #[must_use]
    pub fn max_body(&self) -> usize {
        self.limit - self.body_offset
    }

    /// Whether the record is stored inline.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.buffer.is_inline()
    }

    /// Whether a body header precedes the body.
    #[must_use]
    pub fn has_body_header(&self) -> bool {
        self.version.supports_body_headers()
            && self.body_offset > SLOT_OFFSET + BODY_HEADER_MARKER_SIZE
    }

    /// The body header, if present.
    #[must_use]
    pub fn body_header(&self) -> Option<BodyHeader> {
        if !self.has_body_header() {
            return None;
        }
        BodyHeader::decode(&self.as_bytes()[SLOT_OFFSET..self.body_offset]).ok()
    }

    /// Stamps the record with a body header.
    ///
    /// An existing body header is overwritten in place (extension bytes
    /// are kept). Otherwise the body is shifted to make room.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NoBodyHeader`] for generations without body
    /// headers, or [`RecordError::CapacityExceeded`] if the shifted body
    /// no longer fits.
    pub fn set_body_header(&mut self, header: BodyHeader) -> RecordResult<()> {
        if !self.version.supports_body_headers() {
            return Err(RecordError::NoBodyHeader {
                item_type: self.item_type(),
            });
        }
        if !self.has_body_header() {
            let grow = BODY_HEADER_SIZE - BODY_HEADER_MARKER_SIZE;
            self.buffer
                .insert_gap(SLOT_OFFSET + BODY_HEADER_MARKER_SIZE, grow)?;
            self.buffer
                .write_u32_at(SLOT_OFFSET, BODY_HEADER_SIZE as u32)?;
            self.body_offset += grow;
            self.limit += grow;
        }
        self.buffer.write_u64_at(SLOT_OFFSET + 4, header.timestamp)?;
        self.buffer.write_u32_at(SLOT_OFFSET + 12, header.source_id)?;
        self.buffer.write_u32_at(SLOT_OFFSET + 16, header.barrier_type)?;
        self.update_size();
        Ok(())
    }

    /// Offset of the first body byte.
    #[must_use]
    pub fn body_offset(&self) -> usize {
        self.body_offset
    }

    /// The body bytes written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.as_bytes()[self.body_offset..]
    }

    /// Offset of the next byte to be written.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    /// Moves the cursor within the body.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if `position` is before the
    /// body, or [`RecordError::CapacityExceeded`] if it is past the largest
    /// body.
    pub fn set_cursor(&mut self, position: usize) -> RecordResult<()> {
        if position < self.body_offset {
            return Err(RecordError::invalid_argument(format!(
                "cursor {position} is before the body at {}",
                self.body_offset
            )));
        }
        if position > self.limit {
            return Err(RecordError::capacity_exceeded(
                position - self.body_offset,
                self.max_body(),
            ));
        }
        self.buffer.set_cursor(position)
    }

    /// Body bytes that can still be written.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.cursor())
    }

    /// Fails unless `len` more body bytes fit.
    fn ensure_room(&self, len: usize) -> RecordResult<()> {
        if len > self.remaining() {
            let required = (self.cursor() - self.body_offset).saturating_add(len);
            return Err(RecordError::capacity_exceeded(required, self.max_body()));
        }
        Ok(())
    }

    /// Appends bytes to the body and updates the size field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CapacityExceeded`] if the bytes do not fit;
    /// the record is left unchanged.
    pub fn append(&mut self, data: &[u8]) -> RecordResult<()> {
        self.put_bytes(data)?;
        self.update_size();
        Ok(())
    }

    /// Stores the cursor position in the size field.
    pub fn update_size(&mut self) {
        self.buffer.update_size();
    }

    /// Appends a `u16` without updating the size field.
    pub(crate) fn put_u16(&mut self, value: u16) -> RecordResult<()> {
        self.ensure_room(2)?;
        self.buffer.put_u16(value)
    }

    /// Appends a `u32` without updating the size field.
    pub(crate) fn put_u32(&mut self, value: u32) -> RecordResult<()> {
        self.ensure_room(4)?;
        self.buffer.put_u32(value)
    }

    /// Appends a `u64` without updating the size field.
    pub(crate) fn put_u64(&mut self, value: u64) -> RecordResult<()> {
        self.ensure_room(8)?;
        self.buffer.put_u64(value)
    }

    /// Appends bytes without updating the size field.
    pub(crate) fn put_bytes(&mut self, data: &[u8]) -> RecordResult<()> {
        self.ensure_room(data.len())?;
        self.buffer.put_bytes(data)
    }

    /// Appends zeros without updating the size field.
    pub(crate) fn put_zeros(&mut self, len: usize) -> RecordResult<()> {
        self.ensure_room(len)?;
        self.buffer.put_zeros(len)
    }

    /// Reads a body-relative `u16`; 0 if out of range.
    pub(crate) fn body_u16(&self, offset: usize) -> u16 {
        self.buffer.u16_at(self.body_offset + offset).unwrap_or(0)
    }

    /// Reads a body-relative `u32`; 0 if out of range.
    pub(crate) fn body_u32(&self, offset: usize) -> u32 {
        self.buffer.u32_at(self.body_offset + offset).unwrap_or(0)
    }

    /// Reads a body-relative `u64`; 0 if out of range.
    pub(crate) fn body_u64(&self, offset: usize) -> u64 {
        self.buffer.u64_at(self.body_offset + offset).unwrap_or(0)
    }

    /// Overwrites body-relative bytes.
    pub(crate) fn write_body(&mut self, offset: usize, data: &[u8]) -> RecordResult<()> {
        self.buffer.write_at(self.body_offset + offset, data)
    }

    /// Overwrites a body-relative `u32`.
    pub(crate) fn write_body_u32(&mut self, offset: usize, value: u32) -> RecordResult<()> {
        self.buffer.write_u32_at(self.body_offset + offset, value)
    }

    /// Overwrites a body-relative `u64`.
    pub(crate) fn write_body_u64(&mut self, offset: usize, value: u64) -> RecordResult<()> {
        self.buffer.write_u64_at(self.body_offset + offset, value)
    }

    /// Fails with [`RecordError::Malformed`] if the body is shorter than
    /// `needed` bytes.
    pub(crate) fn require_body(&self, needed: usize, kind: &str) -> RecordResult<()> {
        let actual = self.body().len();
        if actual < needed {
            return Err(RecordError::malformed(format!(
                "{kind} body needs {needed} bytes, record has {actual}"
            )));
        }
        Ok(())
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.buffer == other.buffer
    }
}

impl Eq for Frame {}

#[cfg(test)]
mod tests {
    use super::*;
    use ringitem_format::item_type::PHYSICS_EVENT;

    #[test]
    fn new_frame_sizes() {
        let v10 = Frame::new(FormatVersion::V10, PHYSICS_EVENT, 16).unwrap();
        assert_eq!(v10.size(), 8);
        assert_eq!(v10.body_offset(), 8);
        assert_eq!(v10.capacity(), 24);

        let v11 = Frame::new(FormatVersion::V11, PHYSICS_EVENT, 16).unwrap();
        assert_eq!(v11.size(), 12);
        assert_eq!(&v11.as_bytes()[8..12], &0u32.to_le_bytes());

        let v12 = Frame::new(FormatVersion::V12, PHYSICS_EVENT, 16).unwrap();
        assert_eq!(v12.size(), 12);
        assert_eq!(&v12.as_bytes()[8..12], &4u32.to_le_bytes());
        assert!(!v12.has_body_header());
        assert_eq!(v12.body_header(), None);
    }

    #[test]
    fn with_body_header_places_body_after_it() {
        let header = BodyHeader::new(0x1234, 7, 2);
        let frame = Frame::with_body_header(FormatVersion::V12, PHYSICS_EVENT, header, 0).unwrap();
        assert_eq!(frame.size(), 28);
        assert_eq!(frame.body_offset(), 28);
        assert_eq!(frame.body_header(), Some(header));
    }

    #[test]
    fn v10_rejects_body_header() {
        let header = BodyHeader::new(1, 2, 3);
        assert!(matches!(
            Frame::with_body_header(FormatVersion::V10, PHYSICS_EVENT, header, 0),
            Err(RecordError::NoBodyHeader { item_type: 30 })
        ));
        let mut frame = Frame::new(FormatVersion::V10, PHYSICS_EVENT, 0).unwrap();
        assert!(matches!(
            frame.set_body_header(header),
            Err(RecordError::NoBodyHeader { .. })
        ));
    }

    #[test]
    fn set_body_header_shifts_body() {
        let mut frame = Frame::new(FormatVersion::V11, PHYSICS_EVENT, 8).unwrap();
        frame.append(&[1, 2, 3, 4]).unwrap();
        let header = BodyHeader::new(99, 3, 0);
        frame.set_body_header(header).unwrap();
        assert_eq!(frame.body_header(), Some(header));
        assert_eq!(frame.body(), &[1, 2, 3, 4]);
        assert_eq!(frame.size(), 32);

        let replacement = BodyHeader::new(100, 4, 1);
        frame.set_body_header(replacement).unwrap();
        assert_eq!(frame.body_header(), Some(replacement));
        assert_eq!(frame.size(), 32);
    }

    #[test]
    fn append_respects_capacity() {
        let mut frame = Frame::new(FormatVersion::V10, PHYSICS_EVENT, 4).unwrap();
        frame.append(&[1, 2, 3, 4]).unwrap();
        assert!(matches!(
            frame.append(&[5]),
            Err(RecordError::CapacityExceeded { .. })
        ));
        assert_eq!(frame.size(), 12);
    }

    #[test]
    fn body_cannot_grow_past_declared_size() {
        for version in FormatVersion::ALL {
            let mut frame = Frame::new(version, PHYSICS_EVENT, 4).unwrap();
            assert_eq!(frame.max_body(), 4);
            assert!(matches!(
                frame.append(&[0; 5]),
                Err(RecordError::CapacityExceeded {
                    required: 5,
                    available: 4
                })
            ));
            frame.append(&[1, 2, 3, 4]).unwrap();
            assert_eq!(frame.remaining(), 0);
            assert!(frame.append(&[5]).is_err());
            assert!(frame.set_cursor(frame.body_offset() + 5).is_err());
            assert_eq!(frame.body(), &[1, 2, 3, 4]);
        }
    }

    #[test]
    fn full_body_still_takes_a_body_header() {
        for version in [FormatVersion::V11, FormatVersion::V12] {
            let mut frame = Frame::new(version, PHYSICS_EVENT, 4).unwrap();
            frame.append(&[1, 2, 3, 4]).unwrap();
            let header = BodyHeader::new(1, 2, 3);
            frame.set_body_header(header).unwrap();
            assert_eq!(frame.body_header(), Some(header));
            assert_eq!(frame.body(), &[1, 2, 3, 4]);
            assert_eq!(frame.max_body(), 4);
            assert_eq!(frame.remaining(), 0);
            assert_eq!(frame.size(), 32);
        }
    }

    #[test]
    fn copied_records_are_full() {
        let mut frame = Frame::new(FormatVersion::V12, PHYSICS_EVENT, 8).unwrap();
        frame.append(&[7, 7]).unwrap();
        let mut copy = Frame::from_bytes(FormatVersion::V12, frame.as_bytes()).unwrap();
        assert_eq!(copy, frame);
        assert_eq!(copy.max_body(), 2);
        assert!(matches!(
            copy.append(&[8]),
            Err(RecordError::CapacityExceeded { .. })
        ));
        copy.set_body_header(BodyHeader::new(4, 5, 6)).unwrap();
        assert_eq!(copy.body(), &[7, 7]);
    }

    #[test]
    fn from_bytes_validates_size() {
        let frame = Frame::new(FormatVersion::V12, PHYSICS_EVENT, 4).unwrap();
        let mut bytes = frame.as_bytes().to_vec();
        let copy = Frame::from_bytes(FormatVersion::V12, &bytes).unwrap();
        assert_eq!(copy, frame);

        bytes[0] = 40;
        assert!(matches!(
            Frame::from_bytes(FormatVersion::V12, &bytes),
            Err(RecordError::Malformed { .. })
        ));
        bytes[0] = 4;
        assert!(matches!(
            Frame::from_bytes(FormatVersion::V12, &bytes),
            Err(RecordError::Malformed { .. })
        ));
        assert!(Frame::from_bytes(FormatVersion::V12, &bytes[..3]).is_err());
    }

    #[test]
    fn from_bytes_ignores_trailing_bytes() {
        let mut frame = Frame::new(FormatVersion::V11, PHYSICS_EVENT, 4).unwrap();
        frame.append(&[9, 9]).unwrap();
        let mut bytes = frame.as_bytes().to_vec();
        bytes.extend_from_slice(&[0xff; 10]);
        let copy = Frame::from_bytes(FormatVersion::V11, &bytes).unwrap();
        assert_eq!(copy.body(), &[9, 9]);
    }

    #[test]
    fn cursor_cannot_move_before_body() {
        let mut frame = Frame::new(FormatVersion::V12, PHYSICS_EVENT, 8).unwrap();
        assert!(frame.set_cursor(4).is_err());
        frame.set_cursor(16).unwrap();
        frame.update_size();
        assert_eq!(frame.size(), 16);
    }
}
