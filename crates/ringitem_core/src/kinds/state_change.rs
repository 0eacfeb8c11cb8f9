//! Run state change records.

use super::{
    check_body_header, check_divisor, divisor, expect_type, original_source_id, reparse,
    resolve_original_source_id, seconds, unix_now,
};
use crate::error::{RecordError, RecordResult};
use crate::frame::Frame;
use crate::item::{describe_header, AsRingItem, RingItem};
use crate::wire::WireFormat;
use ringitem_format::item_type::{self, BEGIN_RUN, END_RUN, PAUSE_RUN, RESUME_RUN};
use ringitem_format::{BodyHeader, TITLE_FIELD_SIZE, TITLE_MAXSIZE};
use std::fmt::Write as _;
use std::marker::PhantomData;

/// Why a run changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChangeReason {
    /// The run started.
    Begin,
    /// The run ended.
    End,
    /// The run was paused.
    Pause,
    /// The run resumed after a pause.
    Resume,
}

impl StateChangeReason {
    /// The item type code for this reason.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Begin => BEGIN_RUN,
            Self::End => END_RUN,
            Self::Pause => PAUSE_RUN,
            Self::Resume => RESUME_RUN,
        }
    }

    /// Display name, e.g. `"Begin Run"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Begin => "Begin Run",
            Self::End => "End Run",
            Self::Pause => "Pause Run",
            Self::Resume => "Resume Run",
        }
    }
}

impl TryFrom<u32> for StateChangeReason {
    type Error = RecordError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            BEGIN_RUN => Ok(Self::Begin),
            END_RUN => Ok(Self::End),
            PAUSE_RUN => Ok(Self::Pause),
            RESUME_RUN => Ok(Self::Resume),
            code => Err(RecordError::InvalidTransition { code }),
        }
    }
}

/// Field values for a new state change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChangeParams {
    /// Type code of the transition; must be begin, end, pause or resume.
    pub code: u32,
    /// Run number.
    pub run_number: u32,
    /// Time into the run, in `offset_divisor` ticks.
    pub time_offset: u32,
    /// Ticks per second of `time_offset`.
    pub offset_divisor: u32,
    /// Wall clock time in seconds since the epoch.
    pub timestamp: u32,
    /// Run title, at most 80 bytes.
    pub title: String,
    /// Body header to stamp the record with.
    pub body_header: Option<BodyHeader>,
    /// Original source id; defaults to the body header's source id.
    pub original_source_id: Option<u32>,
}

impl StateChangeParams {
    /// Parameters for a transition at time zero, stamped now.
    #[must_use]
    pub fn new(reason: StateChangeReason, run_number: u32, title: impl Into<String>) -> Self {
        Self::with_code(reason.code(), run_number, title)
    }

    /// Like [`StateChangeParams::new`] with a raw type code, validated when
    /// the record is built.
    #[must_use]
    pub fn with_code(code: u32, run_number: u32, title: impl Into<String>) -> Self {
        Self {
            code,
            run_number,
            time_offset: 0,
            offset_divisor: 1,
            timestamp: unix_now(),
            title: title.into(),
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

/// Accessors shared by state change records of every generation.
pub trait StateChangeItem: RingItem + AsRingItem {
    /// The transition this record marks.
    fn reason(&self) -> StateChangeReason;
    /// Run number.
    fn run_number(&self) -> u32;
    /// Replaces the run number.
    fn set_run_number(&mut self, run: u32) -> RecordResult<()>;
    /// Raw time offset, in divisor ticks.
    fn time_offset(&self) -> u32;
    /// Replaces the raw time offset.
    fn set_time_offset(&mut self, offset: u32) -> RecordResult<()>;
    /// Ticks per second of the time offset (1 where the layout has none).
    fn offset_divisor(&self) -> u32;
    /// Time offset in seconds.
    fn compute_elapsed_time(&self) -> f64 {
        seconds(self.time_offset(), self.offset_divisor())
    }
    /// Wall clock time in seconds since the epoch.
    fn timestamp(&self) -> u32;
    /// Replaces the wall clock time.
    fn set_timestamp(&mut self, timestamp: u32) -> RecordResult<()>;
    /// Run title.
    fn title(&self) -> String;
    /// Replaces the run title.
    fn set_title(&mut self, title: &str) -> RecordResult<()>;
    /// Source id of the producer, preserved through event building.
    fn original_source_id(&self) -> u32;
}

/// A run state change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

fn encode_title(title: &str) -> RecordResult<[u8; TITLE_FIELD_SIZE]> {
    let bytes = title.as_bytes();
    if bytes.len() > TITLE_MAXSIZE {
        return Err(RecordError::invalid_argument(format!(
            "title is {} bytes, at most {TITLE_MAXSIZE} allowed",
            bytes.len()
        )));
    }
    if bytes.contains(&0) {
        return Err(RecordError::invalid_argument("title contains a NUL byte"));
    }
    let mut field = [0u8; TITLE_FIELD_SIZE];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

impl<F: WireFormat> StateChange<F> {
    /// Builds a state change record.
    ///
    /// # Errors
    ///
    /// - [`RecordError::InvalidTransition`] for a type code other than
    ///   begin, end, pause or resume
    /// - [`RecordError::InvalidArgument`] for a title over 80 bytes, a zero
    ///   divisor, or a field the generation cannot store
    /// - [`RecordError::NoBodyHeader`] for a body header under v10
    pub fn new(params: &StateChangeParams) -> RecordResult<Self> {
        let reason = StateChangeReason::try_from(params.code)?;
        let layout = F::layouts().state_change;
        let header = params.body_header.as_ref();
        check_body_header(F::VERSION, params.code, header)?;
        check_divisor(F::VERSION, layout.offset_divisor, params.offset_divisor)?;
        let original = resolve_original_source_id(
            F::VERSION,
            layout.original_source_id,
            params.original_source_id,
            header,
        )?;
        let title = encode_title(&params.title)?;

        let mut frame = Frame::build(F::VERSION, reason.code(), params.body_header, layout.body_size())?;
        frame.put_zeros(layout.body_size())?;
        frame.write_body_u32(layout.run_number, params.run_number)?;
        frame.write_body_u32(layout.time_offset, params.time_offset)?;
        frame.write_body_u32(layout.timestamp, params.timestamp)?;
        if let Some(offset) = layout.offset_divisor {
            frame.write_body_u32(offset, params.offset_divisor)?;
        }
        if let Some(offset) = layout.original_source_id {
            frame.write_body_u32(offset, original)?;
        }
        frame.write_body(layout.title, &title)?;
        frame.update_size();
        Ok(Self::wrap(frame))
    }

    /// Views an existing record as a state change.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::WrongKind`] if `item` is not a state change,
    /// or [`RecordError::Malformed`] if its body is too short.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(
            F::VERSION,
            item,
            item_type::is_state_change,
            "state change",
        )?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, item_type::is_state_change, "state change")?;
        frame.require_body(F::layouts().state_change.body_size(), "state change")?;
        Ok(Self::wrap(frame))
    }

    fn wrap(frame: Frame) -> Self {
        Self {
            frame,
            _format: PhantomData,
        }
    }
}

impl<F: WireFormat> RingItem for StateChange<F> {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn fixed_body_size(&self) -> usize {
        F::layouts().state_change.body_size()
    }

    fn type_name(&self) -> String {
        self.reason().name().to_string()
    }

    fn describe(&self) -> String {
        let mut out = describe_header(self);
        let _ = writeln!(out, "Run number: {}", self.run_number());
        let _ = writeln!(out, "Title: {}", self.title());
        let _ = writeln!(out, "Elapsed: {} seconds", self.compute_elapsed_time());
        let _ = writeln!(out, "Timestamp: {}", self.timestamp());
        let _ = writeln!(out, "Original source id: {}", self.original_source_id());
        out
    }
}

impl<F: WireFormat> StateChangeItem for StateChange<F> {
    fn reason(&self) -> StateChangeReason {
        // The type code was validated when the view was built.
        StateChangeReason::try_from(self.item_type()).unwrap_or(StateChangeReason::Begin)
    }

    fn run_number(&self) -> u32 {
        self.frame.body_u32(F::layouts().state_change.run_number)
    }

    fn set_run_number(&mut self, run: u32) -> RecordResult<()> {
        self.frame
            .write_body_u32(F::layouts().state_change.run_number, run)
    }

    fn time_offset(&self) -> u32 {
        self.frame.body_u32(F::layouts().state_change.time_offset)
    }

    fn set_time_offset(&mut self, offset: u32) -> RecordResult<()> {
        self.frame
            .write_body_u32(F::layouts().state_change.time_offset, offset)
    }

    fn offset_divisor(&self) -> u32 {
        divisor(&self.frame, F::layouts().state_change.offset_divisor)
    }

    fn timestamp(&self) -> u32 {
        self.frame.body_u32(F::layouts().state_change.timestamp)
    }

    fn set_timestamp(&mut self, timestamp: u32) -> RecordResult<()> {
        self.frame
            .write_body_u32(F::layouts().state_change.timestamp, timestamp)
    }

    fn title(&self) -> String {
        let start = F::layouts().state_change.title;
        let field = self
            .frame
            .body()
            .get(start..start + TITLE_FIELD_SIZE)
            .unwrap_or_default();
        let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
        String::from_utf8_lossy(&field[..end]).into_owned()
    }

    fn set_title(&mut self, title: &str) -> RecordResult<()> {
        let field = encode_title(title)?;
        self.frame
            .write_body(F::layouts().state_change.title, &field)
    }

    fn original_source_id(&self) -> u32 {
        original_source_id(&self.frame, F::layouts().state_change.original_source_id)
    }
}
