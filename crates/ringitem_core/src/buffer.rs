//! Fixed-capacity record storage.
//!
//! A [`RecordBuffer`] is sized once, when its record is built, and never
//! grows. Records up to [`INLINE_CAPACITY`] bytes live inline so the hot
//! path does not allocate; larger records get a dedicated heap buffer.

use crate::error::{RecordError, RecordResult};
use smallvec::SmallVec;
use std::fmt;

/// Largest capacity stored without a heap allocation.
pub const INLINE_CAPACITY: usize = 8 * 1024;

/// Owned bytes of one record plus a write cursor.
///
/// `as_bytes()` covers the bytes from the start of the record to the
/// cursor. Writes past the fixed capacity fail instead of reallocating,
/// so offsets handed out by the record stay valid for its lifetime.
pub struct RecordBuffer {
    storage: SmallVec<[u8; INLINE_CAPACITY]>,
    cursor: usize,
}

impl RecordBuffer {
    /// Creates a zero-filled buffer of exactly `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: SmallVec::from_elem(0, capacity),
            cursor: 0,
        }
    }

    /// Total bytes of storage.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Whether the bytes are held inline rather than on the heap.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        !self.storage.spilled()
    }

    /// Offset of the next byte to be written.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes left between the cursor and the end of storage.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Moves the write cursor.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CapacityExceeded`] if `position` is past the
    /// end of storage.
    pub fn set_cursor(&mut self, position: usize) -> RecordResult<()> {
        if position > self.capacity() {
            return Err(RecordError::capacity_exceeded(position, self.capacity()));
        }
        self.cursor = position;
        Ok(())
    }

    fn claim(&mut self, len: usize) -> RecordResult<usize> {
        let start = self.cursor;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.capacity())
            .ok_or_else(|| {
                RecordError::capacity_exceeded(start.saturating_add(len), self.capacity())
            })?;
        self.cursor = end;
        Ok(start)
    }

    /// Appends raw bytes at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CapacityExceeded`] if the bytes do not fit.
    pub fn put_bytes(&mut self, data: &[u8]) -> RecordResult<()> {
        let start = self.claim(data.len())?;
        self.storage[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Advances the cursor by `len` and returns the claimed bytes so a
    /// reader can fill them in place.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CapacityExceeded`] if the bytes do not fit.
    pub fn claim_slice(&mut self, len: usize) -> RecordResult<&mut [u8]> {
        let start = self.claim(len)?;
        Ok(&mut self.storage[start..start + len])
    }

    /// Appends `len` zero bytes at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::CapacityExceeded`] if the bytes do not fit.
    pub fn put_zeros(&mut self, len: usize) -> RecordResult<()> {
        let start = self.claim(len)?;
        self.storage[start..start + len].fill(0);
        Ok(())
    }

    /// Appends a little-endian `u16`.
    pub fn put_u16(&mut self, value: u16) -> RecordResult<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    /// Appends a little-endian `u32`.
    pub fn put_u32(&mut self, value: u32) -> RecordResult<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    /// Appends a little-endian `u64`.
    pub fn put_u64(&mut self, value: u64) -> RecordResult<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    /// Overwrites already written bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::OutOfRange`] if the span is not entirely
    /// below the cursor.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) -> RecordResult<()> {
        match offset.checked_add(data.len()) {
            Some(end) if end <= self.cursor => {
                self.storage[offset..end].copy_from_slice(data);
                Ok(())
            }
            _ => Err(RecordError::OutOfRange {
                index: offset,
                count: self.cursor,
            }),
        }
    }

    /// Overwrites a little-endian `u16` at `offset`.
    pub fn write_u16_at(&mut self, offset: usize, value: u16) -> RecordResult<()> {
        self.write_at(offset, &value.to_le_bytes())
    }

    /// Overwrites a little-endian `u32` at `offset`.
    pub fn write_u32_at(&mut self, offset: usize, value: u32) -> RecordResult<()> {
        self.write_at(offset, &value.to_le_bytes())
    }

    /// Overwrites a little-endian `u64` at `offset`.
    pub fn write_u64_at(&mut self, offset: usize, value: u64) -> RecordResult<()> {
        self.write_at(offset, &value.to_le_bytes())
    }

    /// Reads a `u16` from the written bytes.
    #[must_use]
    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        ringitem_format::u16_at(self.as_bytes(), offset).ok()
    }

    /// Reads a `u32` from the written bytes.
    #[must_use]
    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        ringitem_format::u32_at(self.as_bytes(), offset).ok()
    }

    /// Reads a `u64` from the written bytes.
    #[must_use]
    pub fn u64_at(&self, offset: usize) -> Option<u64> {
        ringitem_format::u64_at(self.as_bytes(), offset).ok()
    }

    /// Opens a zeroed gap of `len` bytes at `at`, shifting the written
    /// bytes after it toward the end of storage.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::OutOfRange`] if `at` is past the cursor or
    /// [`RecordError::CapacityExceeded`] if the shifted bytes do not fit.
    pub fn insert_gap(&mut self, at: usize, len: usize) -> RecordResult<()> {
        if at > self.cursor {
            return Err(RecordError::OutOfRange {
                index: at,
                count: self.cursor,
            });
        }
        let end = self.cursor;
        let new_end = end
            .checked_add(len)
            .filter(|e| *e <= self.capacity())
            .ok_or_else(|| RecordError::capacity_exceeded(end.saturating_add(len), self.capacity()))?;
        self.storage.copy_within(at..end, at + len);
        self.storage[at..at + len].fill(0);
        self.cursor = new_end;
        Ok(())
    }

    /// Stores the cursor position in the record's size field.
    pub fn update_size(&mut self) {
        if self.cursor < 4 {
            return;
        }
        let size = u32::try_from(self.cursor).unwrap_or(u32::MAX);
        self.storage[..4].copy_from_slice(&size.to_le_bytes());
    }

    /// The written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }
}

impl Clone for RecordBuffer {
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.capacity());
        copy.storage[..self.cursor].copy_from_slice(self.as_bytes());
        copy.cursor = self.cursor;
        copy
    }
}

impl PartialEq for RecordBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for RecordBuffer {}

impl fmt::Debug for RecordBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBuffer")
            .field("len", &self.cursor)
            .field("capacity", &self.capacity())
            .field("inline", &self.is_inline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_buffers_are_inline() {
        assert!(RecordBuffer::with_capacity(128).is_inline());
        assert!(RecordBuffer::with_capacity(INLINE_CAPACITY).is_inline());
        assert!(!RecordBuffer::with_capacity(INLINE_CAPACITY + 1).is_inline());
    }

    #[test]
    fn put_advances_cursor() {
        let mut buf = RecordBuffer::with_capacity(16);
        buf.put_u32(7).unwrap();
        buf.put_u16(3).unwrap();
        buf.put_u64(9).unwrap();
        assert_eq!(buf.cursor(), 14);
        assert_eq!(buf.remaining(), 2);
        assert_eq!(buf.u32_at(0), Some(7));
        assert_eq!(buf.u16_at(4), Some(3));
        assert_eq!(buf.u64_at(6), Some(9));
    }

    #[test]
    fn writes_past_capacity_fail_without_side_effects() {
        let mut buf = RecordBuffer::with_capacity(6);
        buf.put_u32(1).unwrap();
        let err = buf.put_u32(2).unwrap_err();
        assert!(matches!(
            err,
            RecordError::CapacityExceeded {
                required: 8,
                available: 6
            }
        ));
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn reads_beyond_cursor_are_none() {
        let mut buf = RecordBuffer::with_capacity(16);
        buf.put_u32(1).unwrap();
        assert_eq!(buf.u32_at(4), None);
    }

    #[test]
    fn write_at_requires_written_span() {
        let mut buf = RecordBuffer::with_capacity(16);
        buf.put_u32(1).unwrap();
        buf.write_u32_at(0, 5).unwrap();
        assert_eq!(buf.u32_at(0), Some(5));
        assert!(matches!(
            buf.write_u32_at(2, 5),
            Err(RecordError::OutOfRange { .. })
        ));
    }

    #[test]
    fn update_size_tracks_cursor() {
        let mut buf = RecordBuffer::with_capacity(32);
        buf.put_u32(0).unwrap();
        buf.put_u32(30).unwrap();
        buf.put_bytes(&[1, 2, 3]).unwrap();
        buf.update_size();
        assert_eq!(buf.u32_at(0), Some(11));
    }

    #[test]
    fn insert_gap_shifts_tail() {
        let mut buf = RecordBuffer::with_capacity(12);
        buf.put_bytes(&[1, 2, 3, 4]).unwrap();
        buf.insert_gap(2, 3).unwrap();
        assert_eq!(buf.as_bytes(), &[1, 2, 0, 0, 0, 3, 4]);
        assert!(buf.insert_gap(0, 6).is_err());
        assert_eq!(buf.cursor(), 7);
    }

    #[test]
    fn clone_copies_active_bytes_only() {
        let mut buf = RecordBuffer::with_capacity(64);
        buf.put_bytes(b"abc").unwrap();
        let mut copy = buf.clone();
        assert_eq!(copy, buf);
        assert_eq!(copy.capacity(), 64);
        copy.write_at(0, b"x").unwrap();
        assert_ne!(copy, buf);
        assert_eq!(buf.as_bytes(), b"abc");
    }
}
