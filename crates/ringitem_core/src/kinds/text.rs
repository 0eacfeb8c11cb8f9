//! Documentation records: packet type and monitored variable lists.

use super::{
    check_body_header, check_divisor, divisor, expect_type, original_source_id, reparse,
    resolve_original_source_id, seconds, unix_now,
};
use crate::error::{RecordError, RecordResult};
use crate::frame::Frame;
use crate::item::{describe_header, AsRingItem, RingItem};
use crate::wire::WireFormat;
use ringitem_format::item_type::{self, MONITORED_VARIABLES};
use ringitem_format::{BodyHeader, ByteReader};
use std::fmt::Write as _;
use std::marker::PhantomData;

/// Field values for a new text record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextParams {
    /// Type code; packet types or monitored variables.
    pub item_type: u32,
    /// Strings to pack, in order.
    pub strings: Vec<String>,
    /// Time into the run, in `offset_divisor` ticks.
    pub time_offset: u32,
    /// Ticks per second of `time_offset`.
    pub offset_divisor: u32,
    /// Wall clock time in seconds since the epoch.
    pub timestamp: u32,
    /// Body header to stamp the record with.
    pub body_header: Option<BodyHeader>,
    /// Original source id; defaults to the body header's source id.
    pub original_source_id: Option<u32>,
    /// Body capacity to reserve. `None` sizes the body to fit the strings.
    pub max_body: Option<usize>,
}

impl TextParams {
    /// A text record of `item_type` holding `strings`, stamped now.
    #[must_use]
    pub fn new<I, S>(item_type: u32, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            item_type,
            strings: strings.into_iter().map(Into::into).collect(),
            time_offset: 0,
            offset_divisor: 1,
            timestamp: unix_now(),
            body_header: None,
            original_source_id: None,
            max_body: None,
        }
    }

    /// Sets the time offset and its divisor.
    #[must_use]
    pub fn time_offset(mut self, offset: u32, divisor: u32) -> Self {
        self.time_offset = offset;
        self.offset_divisor = divisor;
        self
    }

    /// Sets the wall clock timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the body header.
    #[must_use]
    pub fn body_header(mut self, header: BodyHeader) -> Self {
        self.body_header = Some(header);
        self
    }

    /// Sets the original source id explicitly.
    #[must_use]
    pub fn original_source_id(mut self, id: u32) -> Self {
        self.original_source_id = Some(id);
        self
    }

    /// Caps the body size; packing more fails.
    #[must_use]
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = Some(bytes);
        self
    }
}

/// Accessors shared by text records of every generation.
pub trait TextItem: RingItem + AsRingItem {
    /// Raw time offset, in divisor ticks.
    fn time_offset(&self) -> u32;
    /// Ticks per second of the time offset (1 where the layout has none).
    fn offset_divisor(&self) -> u32;
    /// Time offset in seconds.
    fn compute_elapsed_time(&self) -> f64 {
        seconds(self.time_offset(), self.offset_divisor())
    }
    /// Wall clock time in seconds since the epoch.
    fn timestamp(&self) -> u32;
    /// Number of strings.
    fn string_count(&self) -> usize;
    /// The strings, in order.
    fn strings(&self) -> Vec<String>;
    /// Source id of the producer, preserved through event building.
    fn original_source_id(&self) -> u32;
}

/// A documentation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

/// Splits a packed string region into `count` strings.
fn unpack(region: &[u8], count: usize) -> RecordResult<Vec<String>> {
    let mut reader = ByteReader::new(region);
    let mut strings = Vec::with_capacity(count.min(region.len()));
    for index in 0..count {
        let bytes = reader.read_cstr().map_err(|_| {
            RecordError::malformed(format!("text string {index} of {count} is not terminated"))
        })?;
        strings.push(String::from_utf8_lossy(bytes).into_owned());
    }
    Ok(strings)
}

impl<F: WireFormat> Text<F> {
    /// Builds a text record.
    ///
    /// # Errors
    ///
    /// - [`RecordError::CapacityExceeded`] if the packed strings do not fit
    ///   in `max_body`; no record is produced
    /// - [`RecordError::InvalidArgument`] for a type code that is not a text
    ///   kind, a string containing NUL, a zero divisor, or a field the
    ///   generation cannot store
    /// - [`RecordError::NoBodyHeader`] for a body header under v10
    pub fn new(params: &TextParams) -> RecordResult<Self> {
        if !item_type::is_text(params.item_type) {
            return Err(RecordError::invalid_argument(format!(
                "item type {} is not a text item type",
                params.item_type
            )));
        }
        let layout = F::layouts().text;
        let header = params.body_header.as_ref();
        check_body_header(F::VERSION, params.item_type, header)?;
        check_divisor(F::VERSION, layout.offset_divisor, params.offset_divisor)?;
        let original = resolve_original_source_id(
            F::VERSION,
            layout.original_source_id,
            params.original_source_id,
            header,
        )?;
        if params.strings.iter().any(|s| s.as_bytes().contains(&0)) {
            return Err(RecordError::invalid_argument("text strings cannot contain NUL"));
        }
        let count = u32::try_from(params.strings.len())
            .map_err(|_| RecordError::invalid_argument("too many strings"))?;

        let packed: usize = params.strings.iter().map(|s| s.len() + 1).sum();
        let required = layout.fixed_size() + packed;
        let capacity = params.max_body.unwrap_or(required);
        if required > capacity {
            return Err(RecordError::capacity_exceeded(required, capacity));
        }

        let mut frame = Frame::build(F::VERSION, params.item_type, params.body_header, capacity)?;
        frame.put_zeros(layout.fixed_size())?;
        frame.write_body_u32(layout.time_offset, params.time_offset)?;
        frame.write_body_u32(layout.timestamp, params.timestamp)?;
        if let Some(offset) = layout.offset_divisor {
            frame.write_body_u32(offset, params.offset_divisor)?;
        }
        if let Some(offset) = layout.original_source_id {
            frame.write_body_u32(offset, original)?;
        }
        frame.write_body_u32(layout.string_count, count)?;
        for string in &params.strings {
            frame.put_bytes(string.as_bytes())?;
            frame.put_zeros(1)?;
        }
        frame.update_size();
        Ok(Self::wrap(frame))
    }

    /// Views an existing record as a text record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::WrongKind`] if `item` is not a text record,
    /// or [`RecordError::Malformed`] if the declared strings are not all
    /// present.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(F::VERSION, item, item_type::is_text, "text")?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, item_type::is_text, "text")?;
        let layout = F::layouts().text;
        frame.require_body(layout.fixed_size(), "text")?;
        let count = frame.body_u32(layout.string_count) as usize;
        unpack(&frame.body()[layout.strings..], count)?;
        Ok(Self::wrap(frame))
    }

    fn wrap(frame: Frame) -> Self {
        Self {
            frame,
            _format: PhantomData,
        }
    }
}

impl<F: WireFormat> RingItem for Text<F> {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn fixed_body_size(&self) -> usize {
        let layout = F::layouts().text;
        let region = self.frame.body().get(layout.strings..).unwrap_or_default();
        let mut reader = ByteReader::new(region);
        for _ in 0..self.string_count() {
            if reader.read_cstr().is_err() {
                break;
            }
        }
        layout.strings + reader.position()
    }

    fn describe(&self) -> String {
        let mut out = describe_header(self);
        let _ = writeln!(out, "Elapsed: {} seconds", self.compute_elapsed_time());
        let _ = writeln!(out, "Timestamp: {}", self.timestamp());
        let _ = writeln!(out, "Original source id: {}", self.original_source_id());
        let _ = writeln!(out, "{} strings:", self.string_count());
        for string in self.strings() {
            let _ = writeln!(out, "  {string}");
        }
        out
    }
}

impl<F: WireFormat> TextItem for Text<F> {
    fn time_offset(&self) -> u32 {
        self.frame.body_u32(F::layouts().text.time_offset)
    }

    fn offset_divisor(&self) -> u32 {
        divisor(&self.frame, F::layouts().text.offset_divisor)
    }

    fn timestamp(&self) -> u32 {
        self.frame.body_u32(F::layouts().text.timestamp)
    }

    fn string_count(&self) -> usize {
        self.frame.body_u32(F::layouts().text.string_count) as usize
    }

    fn strings(&self) -> Vec<String> {
        let region = self
            .frame
            .body()
            .get(F::layouts().text.strings..)
            .unwrap_or_default();
        unpack(region, self.string_count()).unwrap_or_default()
    }

    fn original_source_id(&self) -> u32 {
        original_source_id(&self.frame, F::layouts().text.original_source_id)
    }
}

impl<F: WireFormat> Text<F> {
    /// Whether the record lists monitored variables rather than packet
    /// types.
    #[must_use]
    pub fn is_monitored_variables(&self) -> bool {
        self.item_type() == MONITORED_VARIABLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::GenericItem;
    use crate::wire::{V10, V11, V12};
    use ringitem_format::item_type::PACKET_TYPES;

    #[test]
    fn strings_roundtrip_in_order() {
        let strings = ["first", "", "third string", "x"];
        let item = Text::<V12>::new(&TextParams::new(PACKET_TYPES, strings)).unwrap();
        assert_eq!(item.string_count(), 4);
        assert_eq!(item.strings(), strings);
        assert!(!item.is_monitored_variables());
    }

    #[test]
    fn packed_layout() {
        let item = Text::<V11>::new(
            &TextParams::new(MONITORED_VARIABLES, ["ab", "c"]).time_offset(6, 3),
        )
        .unwrap();
        let body = item.body();
        assert_eq!(&body[16..], b"ab\0c\0");
        assert_eq!(item.size() as usize, 12 + 16 + 5);
        assert!((item.compute_elapsed_time() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cursor_cannot_truncate_strings() {
        let mut item = Text::<V11>::new(&TextParams::new(PACKET_TYPES, ["ab", "c"])).unwrap();
        let end = item.body_cursor();
        assert_eq!(end, item.body_offset() + item.fixed_body_size());
        assert!(item.set_body_cursor(end - 2).is_err());
        assert_eq!(item.strings(), ["ab", "c"]);
    }

    #[test]
    fn overflow_fails_without_a_record() {
        let params = TextParams::new(PACKET_TYPES, ["0123456789"]).max_body(20);
        assert!(matches!(
            Text::<V12>::new(&params),
            Err(RecordError::CapacityExceeded {
                required: 31,
                available: 20
            })
        ));
        let fits = TextParams::new(PACKET_TYPES, ["0123456789"]).max_body(31);
        assert!(Text::<V12>::new(&fits).is_ok());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Text::<V11>::new(&TextParams::new(30, ["a"])).is_err());
        assert!(Text::<V11>::new(&TextParams::new(PACKET_TYPES, ["a\0b"])).is_err());
        assert!(Text::<V10>::new(&TextParams::new(PACKET_TYPES, ["a"]).original_source_id(1)).is_err());
    }

    #[test]
    fn v10_and_v12_original_source_ids() {
        let v10 = Text::<V10>::new(&TextParams::new(PACKET_TYPES, ["a"])).unwrap();
        assert_eq!(v10.original_source_id(), 0);
        let v12 = Text::<V12>::new(
            &TextParams::new(PACKET_TYPES, ["a"]).body_header(BodyHeader::new(1, 4, 0)),
        )
        .unwrap();
        assert_eq!(v12.original_source_id(), 4);
    }

    #[test]
    fn from_item_rejects_truncated_strings() {
        let item = Text::<V11>::new(&TextParams::new(PACKET_TYPES, ["abc"])).unwrap();
        let mut bytes = item.as_bytes().to_vec();
        let count_at = 12 + V11::layouts().text.string_count;
        bytes[count_at..count_at + 4].copy_from_slice(&2u32.to_le_bytes());
        let generic = GenericItem::<V11>::from_bytes(&bytes).unwrap();
        assert!(matches!(
            Text::<V11>::from_item(&generic),
            Err(RecordError::Malformed { .. })
        ));
    }
}
