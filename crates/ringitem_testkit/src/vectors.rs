//! Hand-checked byte vectors for the record wire layouts.
//!
//! Each vector pairs a record built through the public API with the
//! bytes a producer of that generation writes for it, worked out field by
//! field from the layout tables. All integers are little-endian.

use crate::fixtures::{fixed_body_header, FIXED_TIMESTAMP};
use ringitem_core::item_type::PACKET_TYPES;
use ringitem_core::{
    v10, v11, v12, BodyHeader, FormatVersion, GlomPolicy, RecordResult, RingItem, ScalerParams,
    StateChangeParams, StateChangeReason, TextParams,
};

/// A record and the exact bytes it must encode to.
#[derive(Debug, Clone)]
pub struct RecordVector {
    /// Unique identifier for this vector.
    pub id: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Generation the record is built for.
    pub version: FormatVersion,
    /// Expected record bytes (hex-encoded, spaces ignored).
    pub expected_hex: String,
    /// Builds the record through the public API.
    pub build: fn() -> RecordResult<Box<dyn RingItem>>,
}

impl RecordVector {
    /// The expected bytes.
    pub fn expected_bytes(&self) -> Vec<u8> {
        hex_decode(&self.expected_hex)
    }
}

fn empty_event_v11() -> RecordResult<Box<dyn RingItem>> {
    let item: Box<dyn RingItem> = Box::new(v11::PhysicsEvent::new(0)?);
    Ok(item)
}

fn empty_event_v12() -> RecordResult<Box<dyn RingItem>> {
    let item: Box<dyn RingItem> = Box::new(v12::PhysicsEvent::new(0)?);
    Ok(item)
}

fn short_event_v10() -> RecordResult<Box<dyn RingItem>> {
    let item: Box<dyn RingItem> = Box::new(v10::PhysicsEvent::from_payload(&[0xaa, 0xbb])?);
    Ok(item)
}

fn stamped_event_v12() -> RecordResult<Box<dyn RingItem>> {
    let mut event = v12::PhysicsEvent::with_body_header(fixed_body_header(), 4)?;
    event.append_body(&[1, 2, 3, 4])?;
    let item: Box<dyn RingItem> = Box::new(event);
    Ok(item)
}

fn data_format_v11() -> RecordResult<Box<dyn RingItem>> {
    let item: Box<dyn RingItem> = Box::new(v11::DataFormat::new()?);
    Ok(item)
}

fn scaler_v12() -> RecordResult<Box<dyn RingItem>> {
    let params = ScalerParams::new(10, 20, vec![7, 9]).timestamp(FIXED_TIMESTAMP);
    let item: Box<dyn RingItem> = Box::new(v12::Scaler::new(&params)?);
    Ok(item)
}

fn text_v10() -> RecordResult<Box<dyn RingItem>> {
    let params = TextParams::new(PACKET_TYPES, ["a", "bc"]).timestamp(FIXED_TIMESTAMP);
    let item: Box<dyn RingItem> = Box::new(v10::Text::new(&params)?);
    Ok(item)
}

fn glom_v12() -> RecordResult<Box<dyn RingItem>> {
    let item: Box<dyn RingItem> = Box::new(v12::GlomParameters::new(100, true, GlomPolicy::Average)?);
    Ok(item)
}

fn fragment_v10() -> RecordResult<Box<dyn RingItem>> {
    let item: Box<dyn RingItem> = Box::new(v10::Fragment::new(BodyHeader::new(7, 8, 9), &[0xaa, 0xbb])?);
    Ok(item)
}

fn end_run_v12() -> RecordResult<Box<dyn RingItem>> {
    let params = StateChangeParams::new(StateChangeReason::End, 3, "x")
        .time_offset(5, 1)
        .timestamp(FIXED_TIMESTAMP);
    let item: Box<dyn RingItem> = Box::new(v12::StateChange::new(&params)?);
    Ok(item)
}

/// Every record vector.
pub fn record_vectors() -> Vec<RecordVector> {
    vec![
        RecordVector {
            id: "v11_empty_event",
            description: "v11 physics event, no body header (marker 0)",
            version: FormatVersion::V11,
            expected_hex: "0c000000 1e000000 00000000".into(),
            build: empty_event_v11,
        },
        RecordVector {
            id: "v12_empty_event",
            description: "v12 physics event, no body header (marker 4)",
            version: FormatVersion::V12,
            expected_hex: "0c000000 1e000000 04000000".into(),
            build: empty_event_v12,
        },
        RecordVector {
            id: "v10_short_event",
            description: "v10 physics event, body follows the header directly",
            version: FormatVersion::V10,
            expected_hex: "0a000000 1e000000 aabb".into(),
            build: short_event_v10,
        },
        RecordVector {
            id: "v12_stamped_event",
            description: "v12 physics event with a 20 byte body header",
            version: FormatVersion::V12,
            expected_hex: "20000000 1e000000 14000000 0807060504030201 05000000 00000000 01020304"
                .into(),
            build: stamped_event_v12,
        },
        RecordVector {
            id: "v11_data_format",
            description: "v11 format declaration, major 11 minor 0",
            version: FormatVersion::V11,
            expected_hex: "10000000 0c000000 00000000 0b00 0000".into(),
            build: data_format_v11,
        },
        RecordVector {
            id: "v12_scaler",
            description: "v12 incremental scaler record with two counters",
            version: FormatVersion::V12,
            expected_hex: "30000000 14000000 04000000 \
                           0a000000 14000000 00f15365 01000000 \
                           02000000 01000000 00000000 \
                           07000000 09000000"
                .into(),
            build: scaler_v12,
        },
        RecordVector {
            id: "v10_packet_types",
            description: "v10 packet types record, strings packed with NUL terminators",
            version: FormatVersion::V10,
            expected_hex: "19000000 0a000000 00000000 00f15365 02000000 6100 626300".into(),
            build: text_v10,
        },
        RecordVector {
            id: "v12_glom",
            description: "v12 event building parameters",
            version: FormatVersion::V12,
            expected_hex: "18000000 2a000000 04000000 6400000000000000 0100 0200".into(),
            build: glom_v12,
        },
        RecordVector {
            id: "v10_fragment",
            description: "v10 fragment with its tag embedded in the body",
            version: FormatVersion::V10,
            expected_hex: "1e000000 28000000 0700000000000000 08000000 02000000 09000000 aabb"
                .into(),
            build: fragment_v10,
        },
        RecordVector {
            id: "v12_end_run",
            description: "v12 end run with an 81 byte NUL padded title field",
            version: FormatVersion::V12,
            expected_hex: format!(
                "71000000 02000000 04000000 03000000 05000000 00f15365 01000000 00000000 78{}",
                "00".repeat(80)
            ),
            build: end_run_v12,
        },
    ]
}

/// Encodes bytes as hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal string to bytes.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_ids_are_unique() {
        let vectors = record_vectors();
        let mut ids: Vec<_> = vectors.iter().map(|v| v.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), vectors.len());
    }

    #[test]
    fn declared_sizes_match_lengths() {
        for vector in record_vectors() {
            let bytes = vector.expected_bytes();
            let size = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
            assert_eq!(size, bytes.len(), "{}", vector.id);
        }
    }

    #[test]
    fn hex_helpers_round_trip() {
        let bytes = hex_decode("de ad\nbe ef");
        assert_eq!(bytes, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(hex_encode(&bytes), "deadbeef");
    }
}
