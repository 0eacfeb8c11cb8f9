//! Bounds-checked little-endian field reader.

use crate::error::{FormatError, FormatResult};

/// A cursor over a byte slice that decodes little-endian fields.
///
/// Every read checks the remaining length first, so a corrupt length
/// field can never cause an out of bounds access.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a reader positioned at `pos`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is past the end of `data`.
    pub fn at(data: &'a [u8], pos: usize) -> FormatResult<Self> {
        if pos > data.len() {
            return Err(FormatError::unexpected_eof(pos, 0, data.len()));
        }
        Ok(Self { data, pos })
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read `len` raw bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> FormatResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| FormatError::unexpected_eof(self.pos, len, self.data.len()))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> FormatResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read one byte.
    #[inline]
    pub fn read_u8(&mut self) -> FormatResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a little-endian `u16`.
    #[inline]
    pub fn read_u16(&mut self) -> FormatResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian `u32`.
    #[inline]
    pub fn read_u32(&mut self) -> FormatResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian `u64`.
    #[inline]
    pub fn read_u64(&mut self) -> FormatResult<u64> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Read a NUL terminated byte string, returning it without the NUL.
    ///
    /// # Errors
    ///
    /// Returns an error if no terminator is found before the end of data.
    pub fn read_cstr(&mut self) -> FormatResult<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| FormatError::invalid_structure("unterminated string"))?;
        let bytes = &rest[..len];
        self.pos += len + 1;
        Ok(bytes)
    }
}

/// Decode the `u32` at `offset`.
pub fn u32_at(data: &[u8], offset: usize) -> FormatResult<u32> {
    ByteReader::at(data, offset)?.read_u32()
}

/// Decode the `u16` at `offset`.
pub fn u16_at(data: &[u8], offset: usize) -> FormatResult<u16> {
    ByteReader::at(data, offset)?.read_u16()
}

/// Decode the `u64` at `offset`.
pub fn u64_at(data: &[u8], offset: usize) -> FormatResult<u64> {
    ByteReader::at(data, offset)?.read_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0xff];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u16().unwrap(), 1);
        assert_eq!(reader.read_u32().unwrap(), 2);
        assert_eq!(reader.read_u8().unwrap(), 0xff);
        assert!(reader.is_empty());
    }

    #[test]
    fn short_read_is_an_error() {
        let data = [0u8; 3];
        let mut reader = ByteReader::new(&data);
        assert_eq!(
            reader.read_u32(),
            Err(FormatError::unexpected_eof(0, 4, 3))
        );
        // Position is unchanged after a failed read.
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn huge_length_does_not_overflow() {
        let data = [0u8; 8];
        let mut reader = ByteReader::at(&data, 4).unwrap();
        assert!(reader.read_bytes(usize::MAX).is_err());
    }

    #[test]
    fn cstr_reads_up_to_terminator() {
        let data = b"abc\0de\0";
        let mut reader = ByteReader::new(data);
        assert_eq!(reader.read_cstr().unwrap(), b"abc");
        assert_eq!(reader.read_cstr().unwrap(), b"de");
        assert!(reader.is_empty());
    }

    #[test]
    fn cstr_without_terminator_fails() {
        let mut reader = ByteReader::new(b"abc");
        assert!(matches!(
            reader.read_cstr(),
            Err(FormatError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn offset_helpers() {
        let data = 0x1122_3344_5566_7788u64.to_le_bytes();
        assert_eq!(u64_at(&data, 0).unwrap(), 0x1122_3344_5566_7788);
        assert_eq!(u32_at(&data, 4).unwrap(), 0x1122_3344);
        assert_eq!(u16_at(&data, 6).unwrap(), 0x1122);
        assert!(u32_at(&data, 6).is_err());
        assert!(u32_at(&data, 100).is_err());
    }
}
