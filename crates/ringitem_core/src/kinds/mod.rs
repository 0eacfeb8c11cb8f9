//! Kind-specific record views.
//!
//! Every kind has a trait describing its accessors (object safe, so a
//! [`crate::RingItemFactory`] can hand out `Box<dyn ScalerItem>`) and one
//! concrete type generic over the protocol generation.

mod event_count;
mod fragment;
mod physics_event;
mod scaler;
mod state_change;
mod structural;
mod text;

pub use event_count::{EventCountParams, PhysicsEventCount, PhysicsEventCountItem};
pub use fragment::{Fragment, FragmentItem};
pub use physics_event::{PhysicsEvent, PhysicsEventItem};
pub use scaler::{Scaler, ScalerItem, ScalerParams};
pub use state_change::{StateChange, StateChangeItem, StateChangeParams, StateChangeReason};
pub use structural::{
    AbnormalEnd, AbnormalEndItem, DataFormat, DataFormatItem, GlomParameters,
    GlomParametersItem, GlomPolicy,
};
pub use text::{Text, TextItem, TextParams};

use crate::error::{RecordError, RecordResult};
use crate::frame::Frame;
use crate::item::RingItem;
use ringitem_format::{BodyHeader, FormatVersion};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock time in whole seconds, as stored in record bodies.
pub(crate) fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Copies `item` under `version` and checks its type code.
pub(crate) fn reparse(
    version: FormatVersion,
    item: &dyn RingItem,
    accepts: fn(u32) -> bool,
    expected: &str,
) -> RecordResult<Frame> {
    let actual = item.item_type();
    if !accepts(actual) {
        return Err(RecordError::wrong_kind(expected, actual));
    }
    Frame::from_bytes(version, item.as_bytes())
}

/// Checks a frame's type code.
pub(crate) fn expect_type(frame: &Frame, accepts: fn(u32) -> bool, expected: &str) -> RecordResult<()> {
    let actual = frame.item_type();
    if accepts(actual) {
        Ok(())
    } else {
        Err(RecordError::wrong_kind(expected, actual))
    }
}

/// Rejects a divisor the layout cannot hold.
pub(crate) fn check_divisor(
    version: FormatVersion,
    slot: Option<usize>,
    divisor: u32,
) -> RecordResult<()> {
    if divisor == 0 {
        return Err(RecordError::invalid_argument("time divisor must be nonzero"));
    }
    if slot.is_none() && divisor != 1 {
        return Err(RecordError::invalid_argument(format!(
            "{version} records have no time divisor field; divisor must be 1"
        )));
    }
    Ok(())
}

/// Rejects a body header the generation cannot hold.
pub(crate) fn check_body_header(
    version: FormatVersion,
    item_type: u32,
    header: Option<&BodyHeader>,
) -> RecordResult<()> {
    if header.is_some() && !version.supports_body_headers() {
        return Err(RecordError::NoBodyHeader { item_type });
    }
    Ok(())
}

/// The original source id to store in a new record.
///
/// An explicit value wins, then the body header's source id, then 0.
pub(crate) fn resolve_original_source_id(
    version: FormatVersion,
    slot: Option<usize>,
    explicit: Option<u32>,
    header: Option<&BodyHeader>,
) -> RecordResult<u32> {
    if slot.is_none() && explicit.is_some() {
        return Err(RecordError::invalid_argument(format!(
            "{version} records have no original source id field"
        )));
    }
    Ok(explicit
        .or_else(|| header.map(|h| h.source_id))
        .unwrap_or(0))
}

/// Reads the original source id of a record.
///
/// Generations without the field report the body header's source id.
pub(crate) fn original_source_id(frame: &Frame, slot: Option<usize>) -> u32 {
    match slot {
        Some(offset) => frame.body_u32(offset),
        None => frame.body_header().map_or(0, |h| h.source_id),
    }
}

/// Reads a divisor slot; generations without one count whole seconds.
pub(crate) fn divisor(frame: &Frame, slot: Option<usize>) -> u32 {
    slot.map_or(1, |offset| frame.body_u32(offset))
}

/// `offset / divisor` in seconds, guarding a zero divisor read from the
/// wire.
pub(crate) fn seconds(offset: u32, divisor: u32) -> f64 {
    f64::from(offset) / f64::from(divisor.max(1))
}
