//! Physics event records.

use super::{expect_type, reparse};
use crate::error::RecordResult;
use crate::frame::Frame;
use crate::item::{describe_header, hex_dump, AsRingItem, RingItem};
use crate::wire::WireFormat;
use ringitem_format::item_type::PHYSICS_EVENT;
use ringitem_format::BodyHeader;
use std::fmt::Write as _;
use std::marker::PhantomData;

fn is_physics_event(code: u32) -> bool {
    code == PHYSICS_EVENT
}

/// Accessors for physics events.
///
/// The payload is opaque to this crate; it is filled with
/// [`RingItem::append_body`] after construction.
pub trait PhysicsEventItem: RingItem + AsRingItem {
    /// The event payload.
    fn payload(&self) -> &[u8] {
        self.body()
    }

    /// Payload length in bytes.
    fn payload_size(&self) -> usize {
        self.payload().len()
    }

    /// Payload bytes that can still be appended.
    fn remaining_capacity(&self) -> usize {
        self.frame().remaining()
    }
}

/// A physics event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicsEvent<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> PhysicsEvent<F> {
    /// An empty event with room for `max_body` payload bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the capacity cannot be represented.
    pub fn new(max_body: usize) -> RecordResult<Self> {
        Frame::new(F::VERSION, PHYSICS_EVENT, max_body).map(Self::wrap)
    }

    /// An empty event stamped with a body header.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::NoBodyHeader`] under v10.
    pub fn with_body_header(header: BodyHeader, max_body: usize) -> RecordResult<Self> {
        Frame::with_body_header(F::VERSION, PHYSICS_EVENT, header, max_body).map(Self::wrap)
    }

    /// An event holding exactly `payload`.
    ///
    /// # Errors
    ///
    /// Returns an error if the capacity cannot be represented.
    pub fn from_payload(payload: &[u8]) -> RecordResult<Self> {
        let mut event = Self::new(payload.len())?;
        event.append_body(payload)?;
        Ok(event)
    }

    /// Views an existing record as a physics event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::WrongKind`] if `item` is not a physics
    /// event.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        Self::from_frame(reparse(F::VERSION, item, is_physics_event, "physics event")?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, is_physics_event, "physics event")?;
        Ok(Self::wrap(frame))
    }

    fn wrap(frame: Frame) -> Self {
        Self {
            frame,
            _format: PhantomData,
        }
    }
}

impl<F: WireFormat> RingItem for PhysicsEvent<F> {
    fn frame(&self) -> &Frame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    fn describe(&self) -> String {
        let mut out = describe_header(self);
        let _ = writeln!(out, "{} bytes of event data", self.payload_size());
        out.push_str(&hex_dump(self.payload()));
        out
    }
}

impl<F: WireFormat> PhysicsEventItem for PhysicsEvent<F> {}
