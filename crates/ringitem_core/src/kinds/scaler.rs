//! Periodic scaler records.

use super::{
    check_body_header, check_divisor, divisor, expect_type, original_source_id, reparse,
    resolve_original_source_id, seconds, unix_now,
};
use crate::error::{RecordError, RecordResult};
use crate::frame::Frame;
use crate::item::{describe_header, AsRingItem, RingItem};
use crate::wire::WireFormat;
use ringitem_format::item_type::PERIODIC_SCALERS;
use ringitem_format::BodyHeader;
use std::fmt::Write as _;
use std::marker::PhantomData;

const SCALER_WIDTH: usize = 4;

fn is_scaler(code: u32) -> bool {
    code == PERIODIC_SCALERS
}

/// Field values for a new scaler record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalerParams {
    /// Start of the counting interval, in divisor ticks into the run.
    pub interval_start: u32,
    /// End of the counting interval, in divisor ticks into the run.
    pub interval_end: u32,
    /// Ticks per second of the interval offsets.
    pub interval_divisor: u32,
    /// Wall clock time in seconds since the epoch.
    pub timestamp: u32,
    /// Whether the counters were cleared at the start of the interval.
    pub is_incremental: bool,
    /// Counter values.
    pub scalers: Vec<u32>,
    /// Body header to stamp the record with.
    pub body_header: Option<BodyHeader>,
    /// Original source id; defaults to the body header's source id.
    pub original_source_id: Option<u32>,
}

impl ScalerParams {
    /// Incremental counters over `[start, end]` seconds, stamped now.
    #[must_use]
    pub fn new(interval_start: u32, interval_end: u32, scalers: Vec<u32>) -> Self {
        Self {
            interval_start,
            interval_end,
            interval_divisor: 1,
            timestamp: unix_now(),
            is_incremental: true,
            scalers,
            body_header: None,
            original_source_id: None,
        }
    }

    /// Sets the interval divisor.
    #[must_use]
    pub fn interval_divisor(mut self, divisor: u32) -> Self {
        self.interval_divisor = divisor;
        self
    }

    /// Sets the wall clock timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Marks the counters as running totals rather than increments.
    #[must_use]
    pub fn cumulative(mut self) -> Self {
        self.is_incremental = false;
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
}

/// Accessors shared by scaler records of every generation.
pub trait ScalerItem: RingItem + AsRingItem {
    /// Raw interval start offset.
    fn interval_start(&self) -> u32;
    /// Raw interval end offset.
    fn interval_end(&self) -> u32;
    /// Ticks per second of the interval offsets (1 where the layout has none).
    fn interval_divisor(&self) -> u32;
    /// Interval start in seconds.
    fn compute_start_time(&self) -> f64 {
        seconds(self.interval_start(), self.interval_divisor())
    }
    /// Interval end in seconds.
    fn compute_end_time(&self) -> f64 {
        seconds(self.interval_end(), self.interval_divisor())
    }
    /// Wall clock time in seconds since the epoch.
    fn timestamp(&self) -> u32;
    /// Whether the counters were cleared at the start of the interval.
    fn is_incremental(&self) -> bool;
    /// Number of counters.
    fn scaler_count(&self) -> usize;
    /// One counter.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::OutOfRange`] if `index >= scaler_count()`.
    fn scaler(&self, index: usize) -> RecordResult<u32>;
    /// Replaces one counter.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::OutOfRange`] if `index >= scaler_count()`.
    fn set_scaler(&mut self, index: usize, value: u32) -> RecordResult<()>;
    /// A copy of every counter.
    fn scalers(&self) -> Vec<u32>;
    /// Source id of the producer, preserved through event building.
    fn original_source_id(&self) -> u32;
}

/// A periodic scaler record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaler<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> Scaler<F> {
    /// Builds a scaler record.
    ///
    /// # Errors
    ///
    /// - [`RecordError::InvalidArgument`] for a zero divisor, or a divisor,
    ///   cumulative flag or original source id the generation cannot store
    /// - [`RecordError::NoBodyHeader`] for a body header under v10
    pub fn new(params: &ScalerParams) -> RecordResult<Self> {
        let layout = F::layouts().scaler;
        let header = params.body_header.as_ref();
        check_body_header(F::VERSION, PERIODIC_SCALERS, header)?;
        check_divisor(F::VERSION, layout.interval_divisor, params.interval_divisor)?;
        if layout.is_incremental.is_none() && !params.is_incremental {
            return Err(RecordError::invalid_argument(format!(
                "{} scalers are always incremental",
                F::VERSION
            )));
        }
        let original = resolve_original_source_id(
            F::VERSION,
            layout.original_source_id,
            params.original_source_id,
            header,
        )?;
        let count = u32::try_from(params.scalers.len())
            .map_err(|_| RecordError::invalid_argument("too many scalers"))?;
        let body_size = layout.fixed_size() + params.scalers.len() * SCALER_WIDTH;

        let mut frame = Frame::build(F::VERSION, PERIODIC_SCALERS, params.body_header, body_size)?;
        frame.put_zeros(layout.fixed_size())?;
        frame.write_body_u32(layout.interval_start, params.interval_start)?;
        frame.write_body_u32(layout.interval_end, params.interval_end)?;
        frame.write_body_u32(layout.timestamp, params.timestamp)?;
        if let Some(offset) = layout.interval_divisor {
            frame.write_body_u32(offset, params.interval_divisor)?;
        }
        frame.write_body_u32(layout.scaler_count, count)?;
        if let Some(offset) = layout.is_incremental {
            frame.write_body_u32(offset, u32::from(params.is_incremental))?;
        }
        if let Some(offset) = layout.original_source_id {
            frame.write_body_u32(offset, original)?;
        }
        for value in &params.scalers {
            frame.put_u32(*value)?;
        }
        frame.update_size();
        Ok(Self::wrap(frame))
    }

    /// Views an existing record as a scaler record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::WrongKind`] if `item` is not a scaler record,
    /// or [`RecordError::Malformed`] if its body cannot hold the declared
    /// number of counters.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(F::VERSION, item, is_scaler, "scaler")?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, is_scaler, "scaler")?;
        let layout = F::layouts().scaler;
        frame.require_body(layout.fixed_size(), "scaler")?;
        let count = frame.body_u32(layout.scaler_count) as usize;
        let needed = count
            .checked_mul(SCALER_WIDTH)
            .and_then(|n| n.checked_add(layout.fixed_size()))
            .ok_or_else(|| RecordError::malformed(format!("scaler count {count} overflows")))?;
        frame.require_body(needed, "scaler")?;
        Ok(Self::wrap(frame))
    }

    fn wrap(frame: Frame) -> Self {
        Self {
            frame,
            _format: PhantomData,
        }
    }

    fn scaler_offset(&self, index: usize) -> RecordResult<usize> {
        let count = self.scaler_count();
        if index >= count {
            return Err(RecordError::OutOfRange { index, count });
        }
        Ok(F::layouts().scaler.scalers + index * SCALER_WIDTH)
    }
}

impl<F: WireFormat> RingItem for Scaler<F> {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn fixed_body_size(&self) -> usize {
        F::layouts().scaler.fixed_size() + self.scaler_count() * SCALER_WIDTH
    }

    fn describe(&self) -> String {
        let mut out = describe_header(self);
        let _ = writeln!(
            out,
            "Interval: {} to {} seconds ({})",
            self.compute_start_time(),
            self.compute_end_time(),
            if self.is_incremental() { "incremental" } else { "cumulative" }
        );
        let _ = writeln!(out, "Timestamp: {}", self.timestamp());
        let _ = writeln!(out, "Original source id: {}", self.original_source_id());
        let _ = writeln!(out, "{} scalers:", self.scaler_count());
        for (index, value) in self.scalers().iter().enumerate() {
            let _ = writeln!(out, "  {index:4}: {value}");
        }
        out
    }
}

impl<F: WireFormat> ScalerItem for Scaler<F> {
    fn interval_start(&self) -> u32 {
        self.frame.body_u32(F::layouts().scaler.interval_start)
    }

    fn interval_end(&self) -> u32 {
        self.frame.body_u32(F::layouts().scaler.interval_end)
    }

    fn interval_divisor(&self) -> u32 {
        divisor(&self.frame, F::layouts().scaler.interval_divisor)
    }

    fn timestamp(&self) -> u32 {
        self.frame.body_u32(F::layouts().scaler.timestamp)
    }

    fn is_incremental(&self) -> bool {
        F::layouts()
            .scaler
            .is_incremental
            .map_or(true, |offset| self.frame.body_u32(offset) != 0)
    }

    fn scaler_count(&self) -> usize {
        self.frame.body_u32(F::layouts().scaler.scaler_count) as usize
    }

    fn scaler(&self, index: usize) -> RecordResult<u32> {
        let offset = self.scaler_offset(index)?;
        Ok(self.frame.body_u32(offset))
    }

    fn set_scaler(&mut self, index: usize, value: u32) -> RecordResult<()> {
        let offset = self.scaler_offset(index)?;
        self.frame.write_body_u32(offset, value)
    }

    fn scalers(&self) -> Vec<u32> {
        let start = F::layouts().scaler.scalers;
        let end = start + self.scaler_count() * SCALER_WIDTH;
        self.frame
            .body()
            .get(start..end)
            .unwrap_or_default()
            .chunks_exact(SCALER_WIDTH)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn original_source_id(&self) -> u32 {
        original_source_id(&self.frame, F::layouts().scaler.original_source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::GenericItem;
    use crate::wire::{V10, V11, V12};

    #[test]
    fn v12_scaler_scenario() {
        let params = ScalerParams::new(10, 20, (0..32).collect())
            .interval_divisor(5)
            .body_header(BodyHeader::new(1000, 5, 0));
        let item = Scaler::<V12>::new(&params).unwrap();
        assert!((item.compute_start_time() - 2.0).abs() < f64::EPSILON);
        assert!((item.compute_end_time() - 4.0).abs() < f64::EPSILON);
        assert_eq!(item.scaler_count(), 32);
        assert_eq!(item.original_source_id(), 5);
        assert_eq!(item.scalers(), (0..32).collect::<Vec<u32>>());
        assert_eq!(item.size() as usize, 8 + 20 + 28 + 32 * 4);
    }

    #[test]
    fn explicit_original_source_id_survives_body_header_rewrite() {
        let params = ScalerParams::new(0, 1, vec![1])
            .body_header(BodyHeader::new(1, 2, 0))
            .original_source_id(7);
        let mut item = Scaler::<V12>::new(&params).unwrap();
        item.set_body_header(BodyHeader::new(1, 99, 0)).unwrap();
        assert_eq!(item.original_source_id(), 7);
        assert_eq!(item.body_header().unwrap().source_id, 99);
    }

    #[test]
    fn indexed_access_is_bounds_checked() {
        let mut item = Scaler::<V11>::new(&ScalerParams::new(0, 1, vec![0; 4])).unwrap();
        item.set_scaler(3, 77).unwrap();
        assert_eq!(item.scaler(3).unwrap(), 77);
        assert!(matches!(
            item.scaler(4),
            Err(RecordError::OutOfRange { index: 4, count: 4 })
        ));
        assert!(item.set_scaler(4, 1).is_err());
    }

    #[test]
    fn cursor_stays_behind_counters() {
        let mut item = Scaler::<V12>::new(&ScalerParams::new(0, 1, vec![1, 2, 3])).unwrap();
        let end = item.body_cursor();
        assert!(matches!(
            item.set_body_cursor(item.body_offset()),
            Err(RecordError::InvalidArgument { .. })
        ));
        assert!(item.set_body_cursor(end - 1).is_err());
        assert_eq!(item.body_cursor(), end);
        assert_eq!(item.scalers(), vec![1, 2, 3]);
        item.set_body_cursor(end).unwrap();
    }

    #[test]
    fn scalers_returns_a_copy() {
        let item = Scaler::<V11>::new(&ScalerParams::new(0, 1, vec![1, 2, 3])).unwrap();
        let mut copy = item.scalers();
        copy[0] = 100;
        assert_eq!(item.scaler(0).unwrap(), 1);
    }

    #[test]
    fn v10_restrictions() {
        let base = ScalerParams::new(0, 10, vec![5; 2]);
        let item = Scaler::<V10>::new(&base).unwrap();
        assert_eq!(item.size() as usize, 8 + 16 + 8);
        assert!(item.is_incremental());
        assert_eq!(item.interval_divisor(), 1);

        assert!(Scaler::<V10>::new(&base.clone().cumulative()).is_err());
        assert!(Scaler::<V10>::new(&base.clone().interval_divisor(2)).is_err());
        assert!(Scaler::<V10>::new(&base.original_source_id(1)).is_err());
    }

    #[test]
    fn cumulative_flag_is_stored() {
        let item = Scaler::<V11>::new(&ScalerParams::new(0, 1, vec![]).cumulative()).unwrap();
        assert!(!item.is_incremental());
        assert_eq!(item.scaler_count(), 0);
    }

    #[test]
    fn zero_divisor_rejected() {
        assert!(matches!(
            Scaler::<V12>::new(&ScalerParams::new(0, 1, vec![]).interval_divisor(0)),
            Err(RecordError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn from_item_validates_declared_count() {
        let item = Scaler::<V11>::new(&ScalerParams::new(0, 1, vec![1, 2])).unwrap();
        let mut bytes = item.as_bytes().to_vec();
        let generic = GenericItem::<V11>::from_bytes(&bytes).unwrap();
        assert_eq!(Scaler::<V11>::from_item(&generic).unwrap(), item);

        // Claim three counters in a body that holds two.
        let count_at = 12 + V11::layouts().scaler.scaler_count;
        bytes[count_at..count_at + 4].copy_from_slice(&3u32.to_le_bytes());
        let generic = GenericItem::<V11>::from_bytes(&bytes).unwrap();
        assert!(matches!(
            Scaler::<V11>::from_item(&generic),
            Err(RecordError::Malformed { .. })
        ));
    }
}
