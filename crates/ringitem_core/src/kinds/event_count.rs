//! Physics event count records.

use super::{
    check_body_header, check_divisor, divisor, expect_type, original_source_id, reparse,
    resolve_original_source_id, seconds, unix_now,
};
use crate::error::RecordResult;
use crate::frame::Frame;
use crate::item::{describe_header, AsRingItem, RingItem};
use crate::wire::WireFormat;
use ringitem_format::item_type::PHYSICS_EVENT_COUNT;
use ringitem_format::BodyHeader;
use std::fmt::Write as _;
use std::marker::PhantomData;

fn is_event_count(code: u32) -> bool {
    code == PHYSICS_EVENT_COUNT
}

/// Field values for a new event count record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCountParams {
    /// Number of events seen so far.
    pub event_count: u64,
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
}

impl EventCountParams {
    /// A count of `event_count` at time zero, stamped now.
    #[must_use]
    pub fn new(event_count: u64) -> Self {
        Self {
            event_count,
            time_offset: 0,
            offset_divisor: 1,
            timestamp: unix_now(),
            body_header: None,
            original_source_id: None,
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
}

/// Accessors shared by event count records of every generation.
pub trait PhysicsEventCountItem: RingItem + AsRingItem {
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
    /// Number of events.
    fn event_count(&self) -> u64;
    /// Replaces the number of events.
    fn set_event_count(&mut self, count: u64) -> RecordResult<()>;
    /// Source id of the producer, preserved through event building.
    fn original_source_id(&self) -> u32;
}

/// A physics event count record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicsEventCount<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> PhysicsEventCount<F> {
    /// Builds an event count record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::InvalidArgument`] for a zero divisor or
    /// a field the generation cannot store, and
    /// [`crate::RecordError::NoBodyHeader`] for a body header under v10.
    pub fn new(params: &EventCountParams) -> RecordResult<Self> {
        let layout = F::layouts().event_count;
        let header = params.body_header.as_ref();
        check_body_header(F::VERSION, PHYSICS_EVENT_COUNT, header)?;
        check_divisor(F::VERSION, layout.offset_divisor, params.offset_divisor)?;
        let original = resolve_original_source_id(
            F::VERSION,
            layout.original_source_id,
            params.original_source_id,
            header,
        )?;

        let mut frame = Frame::build(
            F::VERSION,
            PHYSICS_EVENT_COUNT,
            params.body_header,
            layout.body_size(),
        )?;
        frame.put_zeros(layout.body_size())?;
        frame.write_body_u32(layout.time_offset, params.time_offset)?;
        frame.write_body_u32(layout.timestamp, params.timestamp)?;
        if let Some(offset) = layout.offset_divisor {
            frame.write_body_u32(offset, params.offset_divisor)?;
        }
        if let Some(offset) = layout.original_source_id {
            frame.write_body_u32(offset, original)?;
        }
        frame.write_body_u64(layout.event_count, params.event_count)?;
        frame.update_size();
        Ok(Self::wrap(frame))
    }

    /// Views an existing record as an event count record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::WrongKind`] if `item` is not an event
    /// count, or [`crate::RecordError::Malformed`] if its body is too short.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(F::VERSION, item, is_event_count, "event count")?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, is_event_count, "event count")?;
        frame.require_body(F::layouts().event_count.body_size(), "event count")?;
        Ok(Self::wrap(frame))
    }

    fn wrap(frame: Frame) -> Self {
        Self {
            frame,
            _format: PhantomData,
        }
    }
}

impl<F: WireFormat> RingItem for PhysicsEventCount<F> {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn fixed_body_size(&self) -> usize {
        F::layouts().event_count.body_size()
    }

    fn describe(&self) -> String {
        let mut out = describe_header(self);
        let _ = writeln!(out, "Elapsed: {} seconds", self.compute_elapsed_time());
        let _ = writeln!(out, "Timestamp: {}", self.timestamp());
        let _ = writeln!(out, "Event count: {}", self.event_count());
        let _ = writeln!(out, "Original source id: {}", self.original_source_id());
        out
    }
}

impl<F: WireFormat> PhysicsEventCountItem for PhysicsEventCount<F> {
    fn time_offset(&self) -> u32 {
        self.frame.body_u32(F::layouts().event_count.time_offset)
    }

    fn offset_divisor(&self) -> u32 {
        divisor(&self.frame, F::layouts().event_count.offset_divisor)
    }

    fn timestamp(&self) -> u32 {
        self.frame.body_u32(F::layouts().event_count.timestamp)
    }

    fn event_count(&self) -> u64 {
        self.frame.body_u64(F::layouts().event_count.event_count)
    }

    fn set_event_count(&mut self, count: u64) -> RecordResult<()> {
        self.frame
            .write_body_u64(F::layouts().event_count.event_count, count)
    }

    fn original_source_id(&self) -> u32 {
        original_source_id(&self.frame, F::layouts().event_count.original_source_id)
    }
}
