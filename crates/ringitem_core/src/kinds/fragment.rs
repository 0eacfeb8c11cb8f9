//! Event builder fragments.
//!
//! A fragment is event-builder output: it is tagged with a timestamp,
//! source id and barrier type from the moment it exists. Generations with
//! body headers carry the tag there; v10 embeds it at the front of the
//! body:
//!
//! ```text
//! v10 body: | timestamp (8) | source id (4) | payload size (4) | barrier (4) | payload |
//! ```

use super::{expect_type, reparse};
use crate::error::{RecordError, RecordResult};
use crate::frame::Frame;
use crate::item::{describe_header, hex_dump, AsRingItem, RingItem};
use crate::wire::WireFormat;
use ringitem_format::item_type::{self, EVB_FRAGMENT, EVB_UNKNOWN_PAYLOAD};
use ringitem_format::layout::EmbeddedFragmentLayout;
use ringitem_format::BodyHeader;
use std::fmt::Write as _;
use std::marker::PhantomData;

/// Accessors shared by fragments of every generation.
pub trait FragmentItem: RingItem + AsRingItem {
    /// Event timestamp from the tag.
    fn timestamp(&self) -> u64;
    /// Source id from the tag.
    fn source_id(&self) -> u32;
    /// Barrier type from the tag.
    fn barrier_type(&self) -> u32;
    /// Payload length in bytes.
    fn payload_size(&self) -> usize;
    /// The payload bytes.
    fn payload(&self) -> &[u8];
}

/// An event builder fragment, with a known or unknown payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> Fragment<F> {
    /// Builds a fragment of type `EVB_FRAGMENT`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidArgument`] if the payload length does
    /// not fit the v10 payload size field.
    pub fn new(tag: BodyHeader, payload: &[u8]) -> RecordResult<Self> {
        Self::build(EVB_FRAGMENT, tag, payload)
    }

    /// Builds a fragment of type `EVB_UNKNOWN_PAYLOAD`.
    ///
    /// # Errors
    ///
    /// Same as [`Fragment::new`].
    pub fn unknown_payload(tag: BodyHeader, payload: &[u8]) -> RecordResult<Self> {
        Self::build(EVB_UNKNOWN_PAYLOAD, tag, payload)
    }

    fn build(code: u32, tag: BodyHeader, payload: &[u8]) -> RecordResult<Self> {
        let frame = match F::layouts().embedded_fragment {
            Some(layout) => {
                let size = u32::try_from(payload.len())
                    .map_err(|_| RecordError::invalid_argument("fragment payload too large"))?;
                let mut frame = Frame::new(F::VERSION, code, layout.payload + payload.len())?;
                frame.put_zeros(layout.payload)?;
                frame.write_body_u64(layout.timestamp, tag.timestamp)?;
                frame.write_body_u32(layout.source_id, tag.source_id)?;
                frame.write_body_u32(layout.payload_size, size)?;
                frame.write_body_u32(layout.barrier_type, tag.barrier_type)?;
                frame.put_bytes(payload)?;
                frame
            }
            None => {
                let mut frame = Frame::with_body_header(F::VERSION, code, tag, payload.len())?;
                frame.put_bytes(payload)?;
                frame
            }
        };
        let mut fragment = Self::wrap(frame);
        fragment.frame.update_size();
        Ok(fragment)
    }

    /// Views an existing record as a fragment of either type.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::WrongKind`] if `item` is not a fragment, or
    /// [`RecordError::Malformed`] if its tag is missing or its payload is
    /// truncated.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(F::VERSION, item, item_type::is_fragment, "event fragment")?)
    }

    /// Views an existing record as a fragment of type `EVB_FRAGMENT` only.
    ///
    /// # Errors
    ///
    /// As [`Fragment::from_item`].
    pub fn known_from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(
            F::VERSION,
            item,
            |code| code == EVB_FRAGMENT,
            "event fragment",
        )?)
    }

    /// Views an existing record as a fragment of type
    /// `EVB_UNKNOWN_PAYLOAD` only.
    ///
    /// # Errors
    ///
    /// As [`Fragment::from_item`].
    pub fn unknown_from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(
            F::VERSION,
            item,
            |code| code == EVB_UNKNOWN_PAYLOAD,
            "unknown payload fragment",
        )?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, item_type::is_fragment, "event fragment")?;
        match F::layouts().embedded_fragment {
            Some(layout) => {
                frame.require_body(layout.payload, "event fragment")?;
                let size = frame.body_u32(layout.payload_size) as usize;
                frame.require_body(layout.payload.saturating_add(size), "event fragment")?;
            }
            None => {
                if !frame.has_body_header() {
                    return Err(RecordError::malformed("event fragment has no body header"));
                }
            }
        }
        Ok(Self::wrap(frame))
    }

    fn wrap(frame: Frame) -> Self {
        Self {
            frame,
            _format: PhantomData,
        }
    }

    fn embedded() -> Option<EmbeddedFragmentLayout> {
        F::layouts().embedded_fragment
    }

    /// Whether the payload type is unknown to the event builder.
    #[must_use]
    pub fn is_unknown_payload(&self) -> bool {
        self.item_type() == EVB_UNKNOWN_PAYLOAD
    }
}

impl<F: WireFormat> RingItem for Fragment<F> {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn fixed_body_size(&self) -> usize {
        Self::embedded().map_or(0, |layout| layout.payload + self.payload_size())
    }

    fn has_body_header(&self) -> bool {
        true
    }

    fn body_header(&self) -> Option<BodyHeader> {
        Some(BodyHeader::new(
            self.timestamp(),
            self.source_id(),
            self.barrier_type(),
        ))
    }

    fn set_body_header(&mut self, _header: BodyHeader) -> RecordResult<()> {
        Err(RecordError::FragmentAlreadyStamped)
    }

    fn describe(&self) -> String {
        let mut out = describe_header(self);
        let _ = writeln!(out, "Payload: {} bytes", self.payload_size());
        out.push_str(&hex_dump(self.payload()));
        out
    }
}

impl<F: WireFormat> FragmentItem for Fragment<F> {
    fn timestamp(&self) -> u64 {
        match Self::embedded() {
            Some(layout) => self.frame.body_u64(layout.timestamp),
            None => self.frame.body_header().map_or(0, |h| h.timestamp),
        }
    }

    fn source_id(&self) -> u32 {
        match Self::embedded() {
            Some(layout) => self.frame.body_u32(layout.source_id),
            None => self.frame.body_header().map_or(0, |h| h.source_id),
        }
    }

    fn barrier_type(&self) -> u32 {
        match Self::embedded() {
            Some(layout) => self.frame.body_u32(layout.barrier_type),
            None => self.frame.body_header().map_or(0, |h| h.barrier_type),
        }
    }

    fn payload_size(&self) -> usize {
        self.payload().len()
    }

    fn payload(&self) -> &[u8] {
        let body = self.frame.body();
        match Self::embedded() {
            Some(layout) => {
                let size = self.frame.body_u32(layout.payload_size) as usize;
                body.get(layout.payload..layout.payload.saturating_add(size))
                    .unwrap_or_default()
            }
            None => body,
        }
    }
}
