//! Record header and body header layouts.
//!
//! ```text
//! | size (4) | type (4) | body header slot (v11+) | body (N) |
//! ```
//!
//! The body header slot is absent in v10. In v11 it starts with a `u32`
//! that is 0 when no body header follows; in v12 the empty slot holds 4
//! (its own size). A present body header is
//!
//! ```text
//! | size (4) | timestamp (8) | source id (4) | barrier type (4) |
//! ```
//!
//! where v11 requires `size == 20` and v12 allows larger sizes so that
//! extensions can follow the fixed fields.

use crate::error::{FormatError, FormatResult};
use crate::item_type::RING_FORMAT;
use crate::reader::ByteReader;
use crate::version::FormatVersion;

/// Size of the record header: `size` then `type`.
pub const HEADER_SIZE: usize = 8;

/// Size of a body header without extensions.
pub const BODY_HEADER_SIZE: usize = 20;

/// Size of the slot that marks an absent body header.
pub const BODY_HEADER_MARKER_SIZE: usize = 4;

/// The fixed header that starts every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHeader {
    /// Total record size in bytes, header included.
    pub size: u32,
    /// Item type code (16 significant bits stored in 32).
    pub item_type: u32,
}

impl RecordHeader {
    /// Decode a header from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> FormatResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let size = reader.read_u32()?;
        let item_type = reader.read_u32()?;
        Ok(Self { size, item_type })
    }

    /// Encode the header.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&self.size.to_le_bytes());
        out[4..].copy_from_slice(&self.item_type.to_le_bytes());
        out
    }

    /// Whether the producer wrote the header in the opposite byte order.
    ///
    /// Type codes use only the low 16 bits, so a code whose low half is
    /// zero and high half is not was written by a foreign-endian host.
    #[must_use]
    pub const fn must_swap(&self) -> bool {
        self.item_type & 0xffff == 0 && self.item_type != 0
    }
}

/// Event builder tagging information carried ahead of a record body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BodyHeader {
    /// Event timestamp.
    pub timestamp: u64,
    /// Id of the data source that produced the record.
    pub source_id: u32,
    /// Barrier type; 0 when the record is not a barrier.
    pub barrier_type: u32,
}

impl BodyHeader {
    /// Creates a body header.
    #[must_use]
    pub const fn new(timestamp: u64, source_id: u32, barrier_type: u32) -> Self {
        Self {
            timestamp,
            source_id,
            barrier_type,
        }
    }

    /// Encode with a size field of [`BODY_HEADER_SIZE`].
    #[must_use]
    pub fn encode(&self) -> [u8; BODY_HEADER_SIZE] {
        let mut out = [0u8; BODY_HEADER_SIZE];
        out[..4].copy_from_slice(&(BODY_HEADER_SIZE as u32).to_le_bytes());
        out[4..12].copy_from_slice(&self.timestamp.to_le_bytes());
        out[12..16].copy_from_slice(&self.source_id.to_le_bytes());
        out[16..20].copy_from_slice(&self.barrier_type.to_le_bytes());
        out
    }

    /// Decode the fixed fields, ignoring any extension bytes.
    pub fn decode(bytes: &[u8]) -> FormatResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let size = reader.read_u32()? as usize;
        if size < BODY_HEADER_SIZE {
            return Err(FormatError::invalid_structure(format!(
                "body header size {size} is smaller than {BODY_HEADER_SIZE}"
            )));
        }
        Ok(Self {
            timestamp: reader.read_u64()?,
            source_id: reader.read_u32()?,
            barrier_type: reader.read_u32()?,
        })
    }
}

/// Where a record body starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLocation {
    /// Offset of the first body byte from the start of the record.
    pub body_offset: usize,
    /// The body header, if one precedes the body.
    pub body_header: Option<BodyHeader>,
}

/// Find the body of `record` under the rules of `version`.
///
/// `record` must hold exactly the bytes covered by the header's size
/// field.
///
/// # Errors
///
/// Returns an error if the body header slot holds a value the generation
/// does not allow, or if the body header runs past the record.
pub fn locate_body(version: FormatVersion, record: &[u8]) -> FormatResult<BodyLocation> {
    if !version.supports_body_headers() {
        if record.len() < HEADER_SIZE {
            return Err(FormatError::unexpected_eof(0, HEADER_SIZE, record.len()));
        }
        return Ok(BodyLocation {
            body_offset: HEADER_SIZE,
            body_header: None,
        });
    }

    let marker = ByteReader::at(record, HEADER_SIZE)?.read_u32()? as usize;
    let empty = version.empty_body_header_marker().map(|m| m as usize);
    if Some(marker) == empty {
        return Ok(BodyLocation {
            body_offset: HEADER_SIZE + BODY_HEADER_MARKER_SIZE,
            body_header: None,
        });
    }

    let valid = match version {
        FormatVersion::V11 => marker == BODY_HEADER_SIZE,
        _ => marker >= BODY_HEADER_SIZE,
    };
    if !valid {
        return Err(FormatError::invalid_structure(format!(
            "body header size {marker} is not valid for {version}"
        )));
    }
    let end = HEADER_SIZE + marker;
    if end > record.len() {
        return Err(FormatError::unexpected_eof(HEADER_SIZE, marker, record.len()));
    }
    Ok(BodyLocation {
        body_offset: end,
        body_header: Some(BodyHeader::decode(&record[HEADER_SIZE..end])?),
    })
}

/// Extract `(major, minor)` from a format declaration record.
///
/// Works for any generation that defines format declarations: the body
/// header slot is interpreted by its own size field, so the caller does
/// not need to know the generation in advance.
///
/// # Errors
///
/// Returns an error if the record is not a format declaration or is
/// truncated.
pub fn format_declaration_version(record: &[u8]) -> FormatResult<(u16, u16)> {
    let header = RecordHeader::decode(record)?;
    if header.item_type != RING_FORMAT {
        return Err(FormatError::invalid_structure(format!(
            "item type {} is not a format declaration",
            header.item_type
        )));
    }
    let size = header.size as usize;
    if size > record.len() {
        return Err(FormatError::unexpected_eof(0, size, record.len()));
    }
    let record = &record[..size];
    let slot = ByteReader::at(record, HEADER_SIZE)?.read_u32()? as usize;
    let body_offset = match slot {
        0 | BODY_HEADER_MARKER_SIZE => HEADER_SIZE + BODY_HEADER_MARKER_SIZE,
        s if s >= BODY_HEADER_SIZE => HEADER_SIZE + s,
        s => {
            return Err(FormatError::invalid_structure(format!(
                "body header size {s} is not valid"
            )))
        }
    };
    let mut reader = ByteReader::at(record, body_offset)?;
    let major = reader.read_u16()?;
    let minor = reader.read_u16()?;
    Ok((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version_slot: &[u8], body: &[u8]) -> Vec<u8> {
        let size = (HEADER_SIZE + version_slot.len() + body.len()) as u32;
        let mut out = RecordHeader {
            size,
            item_type: 30,
        }
        .encode()
        .to_vec();
        out.extend_from_slice(version_slot);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn header_roundtrip() {
        let header = RecordHeader {
            size: 24,
            item_type: 42,
        };
        assert_eq!(RecordHeader::decode(&header.encode()).unwrap(), header);
    }

    #[test]
    fn must_swap_detects_foreign_order() {
        let native = RecordHeader {
            size: 8,
            item_type: 1,
        };
        let foreign = RecordHeader {
            size: 8,
            item_type: 1u32.swap_bytes(),
        };
        assert!(!native.must_swap());
        assert!(foreign.must_swap());
    }

    #[test]
    fn body_header_roundtrip() {
        let bh = BodyHeader::new(0x0102_0304_0506_0708, 7, 2);
        let bytes = bh.encode();
        assert_eq!(&bytes[..4], &20u32.to_le_bytes());
        assert_eq!(BodyHeader::decode(&bytes).unwrap(), bh);
    }

    #[test]
    fn v10_body_follows_header() {
        let rec = record(&[], &[1, 2, 3]);
        let loc = locate_body(FormatVersion::V10, &rec).unwrap();
        assert_eq!(loc.body_offset, HEADER_SIZE);
        assert!(loc.body_header.is_none());
    }

    #[test]
    fn v11_empty_marker_is_zero() {
        let rec = record(&0u32.to_le_bytes(), &[9]);
        let loc = locate_body(FormatVersion::V11, &rec).unwrap();
        assert_eq!(loc.body_offset, 12);
        assert!(loc.body_header.is_none());

        // 4 is the v12 marker and is not valid in v11.
        let rec = record(&4u32.to_le_bytes(), &[9]);
        assert!(locate_body(FormatVersion::V11, &rec).is_err());
    }

    #[test]
    fn v12_empty_marker_is_four() {
        let rec = record(&4u32.to_le_bytes(), &[]);
        let loc = locate_body(FormatVersion::V12, &rec).unwrap();
        assert_eq!(loc.body_offset, 12);

        let rec = record(&0u32.to_le_bytes(), &[]);
        assert!(locate_body(FormatVersion::V12, &rec).is_err());
    }

    #[test]
    fn v12_body_header_extension_is_skipped() {
        let bh = BodyHeader::new(5, 6, 0);
        let mut slot = bh.encode().to_vec();
        slot[..4].copy_from_slice(&24u32.to_le_bytes());
        slot.extend_from_slice(&[0xee; 4]);
        let rec = record(&slot, &[1]);
        let loc = locate_body(FormatVersion::V12, &rec).unwrap();
        assert_eq!(loc.body_offset, HEADER_SIZE + 24);
        assert_eq!(loc.body_header, Some(bh));
        assert_eq!(rec[loc.body_offset], 1);
    }

    #[test]
    fn body_header_past_end_is_rejected() {
        let mut rec = record(&20u32.to_le_bytes(), &[0; 4]);
        rec.truncate(16);
        assert!(locate_body(FormatVersion::V11, &rec).is_err());
    }

    #[test]
    fn format_declaration_major_minor() {
        for slot in [0u32, 4u32] {
            let mut rec = RecordHeader {
                size: 16,
                item_type: RING_FORMAT,
            }
            .encode()
            .to_vec();
            rec.extend_from_slice(&slot.to_le_bytes());
            rec.extend_from_slice(&12u16.to_le_bytes());
            rec.extend_from_slice(&3u16.to_le_bytes());
            assert_eq!(format_declaration_version(&rec).unwrap(), (12, 3));
        }
    }

    #[test]
    fn format_declaration_wrong_type() {
        let rec = record(&0u32.to_le_bytes(), &[0; 4]);
        assert!(format_declaration_version(&rec).is_err());
    }
}
