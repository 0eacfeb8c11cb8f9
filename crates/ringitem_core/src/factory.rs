//! Per-generation record factories.
//!
//! A [`RingItemFactory`] builds every kind of record for one protocol
//! generation and moves finished records to and from a transport. The
//! trait is object safe so callers can hold an
//! `Arc<dyn RingItemFactory>` chosen at runtime (see
//! [`crate::select_factory`]); [`Factory`] is the single implementation,
//! parameterized by a [`WireFormat`] marker.

use crate::config::ReaderConfig;
use crate::error::RecordResult;
use crate::frame::Frame;
use crate::io::{read_frame, write_record};
use crate::item::{GenericItem, RingItem};
use crate::kinds::{
    AbnormalEnd, AbnormalEndItem, DataFormat, DataFormatItem, EventCountParams, Fragment,
    FragmentItem, GlomParameters, GlomParametersItem, GlomPolicy, PhysicsEvent,
    PhysicsEventCount, PhysicsEventCountItem, PhysicsEventItem, Scaler, ScalerItem,
    ScalerParams, StateChange, StateChangeItem, StateChangeParams, Text, TextItem, TextParams,
};
use crate::wire::WireFormat;
use ringitem_format::item_type::{
    self, ABNORMAL_ENDRUN, EVB_GLOM_INFO, PERIODIC_SCALERS, PHYSICS_EVENT, PHYSICS_EVENT_COUNT,
    RING_FORMAT,
};
use ringitem_format::{BodyHeader, FormatVersion};
use ringitem_transport::{RecordSink, RecordSource};
use std::fmt;
use std::marker::PhantomData;

/// Builds, reinterprets and transfers records of one protocol generation.
///
/// Factories hold no state, so one instance can serve any number of
/// threads. Kinds the generation does not define are reported with
/// [`crate::RecordError::Unsupported`].
pub trait RingItemFactory: fmt::Debug + Send + Sync {
    /// The generation this factory builds.
    fn version(&self) -> FormatVersion;

    /// An empty record of any type.
    fn make_ring_item(&self, item_type: u32, max_body: usize) -> RecordResult<Box<dyn RingItem>>;

    /// An empty record of any type stamped with a body header.
    fn make_ring_item_with_body_header(
        &self,
        item_type: u32,
        header: BodyHeader,
        max_body: usize,
    ) -> RecordResult<Box<dyn RingItem>>;

    /// Copies a complete record out of raw bytes.
    fn ring_item_from_bytes(&self, bytes: &[u8]) -> RecordResult<Box<dyn RingItem>>;

    /// A generic copy of `item`, reinterpreted under this generation.
    fn copy_ring_item(&self, item: &dyn RingItem) -> RecordResult<Box<dyn RingItem>>;

    /// The kind-specific view matching `item`'s type code.
    ///
    /// User and unknown type codes, and kinds this generation does not
    /// define, come back as generic records.
    fn make_typed(&self, item: &dyn RingItem) -> RecordResult<Box<dyn RingItem>>;

    /// Reads one record from `source` with the default [`ReaderConfig`].
    ///
    /// Returns `Ok(None)` when the source ends cleanly between records.
    fn get_ring_item(&self, source: &mut dyn RecordSource) -> RecordResult<Option<Box<dyn RingItem>>> {
        self.get_ring_item_with(source, &ReaderConfig::default())
    }

    /// Reads one record from `source`.
    ///
    /// The header is read first to learn the record's size, then exactly
    /// the remaining bytes.
    fn get_ring_item_with(
        &self,
        source: &mut dyn RecordSource,
        config: &ReaderConfig,
    ) -> RecordResult<Option<Box<dyn RingItem>>> {
        let Some(frame) = read_frame(self.version(), source, config)? else {
            return Ok(None);
        };
        self.ring_item_from_frame(frame, config).map(Some)
    }

    /// Takes ownership of a complete frame, typed or generic per `config`.
    ///
    /// A frame parsed under another generation is reinterpreted first.
    fn ring_item_from_frame(&self, frame: Frame, config: &ReaderConfig) -> RecordResult<Box<dyn RingItem>>;

    /// Writes `item` to `sink` and flushes it.
    fn put_ring_item(&self, item: &dyn RingItem, sink: &mut dyn RecordSink) -> RecordResult<()> {
        write_record(item, sink)
    }

    /// An abnormal end of run record.
    fn make_abnormal_end(&self) -> RecordResult<Box<dyn AbnormalEndItem>>;
    /// `item` viewed as an abnormal end.
    fn abnormal_end_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn AbnormalEndItem>>;

    /// A format declaration for this generation.
    fn make_data_format(&self) -> RecordResult<Box<dyn DataFormatItem>>;
    /// `item` viewed as a format declaration.
    fn data_format_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn DataFormatItem>>;

    /// An event building parameters record.
    fn make_glom_parameters(
        &self,
        coincidence_ticks: u64,
        is_building: bool,
        policy: GlomPolicy,
    ) -> RecordResult<Box<dyn GlomParametersItem>>;
    /// `item` viewed as event building parameters.
    fn glom_parameters_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn GlomParametersItem>>;

    /// An empty physics event with room for `max_body` payload bytes.
    fn make_physics_event(&self, max_body: usize) -> RecordResult<Box<dyn PhysicsEventItem>>;
    /// An empty physics event stamped with a body header.
    fn make_physics_event_with_body_header(
        &self,
        header: BodyHeader,
        max_body: usize,
    ) -> RecordResult<Box<dyn PhysicsEventItem>>;
    /// `item` viewed as a physics event.
    fn physics_event_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn PhysicsEventItem>>;

    /// A physics event count record.
    fn make_event_count(&self, params: &EventCountParams) -> RecordResult<Box<dyn PhysicsEventCountItem>>;
    /// `item` viewed as a physics event count.
    fn event_count_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn PhysicsEventCountItem>>;

    /// An event builder fragment.
    fn make_fragment(&self, tag: BodyHeader, payload: &[u8]) -> RecordResult<Box<dyn FragmentItem>>;
    /// An event builder fragment whose payload type is unknown.
    fn make_unknown_fragment(&self, tag: BodyHeader, payload: &[u8]) -> RecordResult<Box<dyn FragmentItem>>;
    /// `item` viewed as an event builder fragment.
    fn fragment_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn FragmentItem>>;
    /// `item` viewed as an unknown payload fragment.
    fn unknown_fragment_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn FragmentItem>>;

    /// A periodic scaler record.
    fn make_scaler(&self, params: &ScalerParams) -> RecordResult<Box<dyn ScalerItem>>;
    /// `item` viewed as a scaler record.
    fn scaler_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn ScalerItem>>;

    /// A run state change record.
    fn make_state_change(&self, params: &StateChangeParams) -> RecordResult<Box<dyn StateChangeItem>>;
    /// `item` viewed as a state change.
    fn state_change_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn StateChangeItem>>;

    /// A documentation record.
    fn make_text(&self, params: &TextParams) -> RecordResult<Box<dyn TextItem>>;
    /// `item` viewed as a documentation record.
    fn text_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn TextItem>>;
}

/// The factory for generation `F`.
pub struct Factory<F: WireFormat> {
    _format: PhantomData<fn() -> F>,
}

impl<F: WireFormat> Factory<F> {
    /// Creates the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _format: PhantomData,
        }
    }
}

impl<F: WireFormat> Default for Factory<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: WireFormat> Clone for Factory<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: WireFormat> Copy for Factory<F> {}

impl<F: WireFormat> fmt::Debug for Factory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Factory({})", F::VERSION)
    }
}

/// Wraps an owned frame in the view its type code calls for.
fn typed_from_frame<F: WireFormat>(frame: Frame) -> RecordResult<Box<dyn RingItem>> {
    let code = frame.item_type();
    let bookkeeping = F::VERSION.supports_format_items();
    let item: Box<dyn RingItem> = match code {
        c if item_type::is_state_change(c) => Box::new(StateChange::<F>::from_frame(frame)?),
        c if item_type::is_text(c) => Box::new(Text::<F>::from_frame(frame)?),
        c if item_type::is_fragment(c) => Box::new(Fragment::<F>::from_frame(frame)?),
        PERIODIC_SCALERS => Box::new(Scaler::<F>::from_frame(frame)?),
        PHYSICS_EVENT => Box::new(PhysicsEvent::<F>::from_frame(frame)?),
        PHYSICS_EVENT_COUNT => Box::new(PhysicsEventCount::<F>::from_frame(frame)?),
        ABNORMAL_ENDRUN if bookkeeping => Box::new(AbnormalEnd::<F>::from_frame(frame)?),
        RING_FORMAT if bookkeeping => Box::new(DataFormat::<F>::from_frame(frame)?),
        EVB_GLOM_INFO if bookkeeping => Box::new(GlomParameters::<F>::from_frame(frame)?),
        _ => Box::new(GenericItem::<F>::from_frame(frame)),
    };
    Ok(item)
}

impl<F: WireFormat> RingItemFactory for Factory<F> {
    fn version(&self) -> FormatVersion {
        F::VERSION
    }

    fn make_ring_item(&self, item_type: u32, max_body: usize) -> RecordResult<Box<dyn RingItem>> {
        Ok(Box::new(GenericItem::<F>::new(item_type, max_body)?))
    }

    fn make_ring_item_with_body_header(
        &self,
        item_type: u32,
        header: BodyHeader,
        max_body: usize,
    ) -> RecordResult<Box<dyn RingItem>> {
        Ok(Box::new(GenericItem::<F>::with_body_header(
            item_type, header, max_body,
        )?))
    }

    fn ring_item_from_bytes(&self, bytes: &[u8]) -> RecordResult<Box<dyn RingItem>> {
        Ok(Box::new(GenericItem::<F>::from_bytes(bytes)?))
    }

    fn copy_ring_item(&self, item: &dyn RingItem) -> RecordResult<Box<dyn RingItem>> {
        self.ring_item_from_bytes(item.as_bytes())
    }

    fn make_typed(&self, item: &dyn RingItem) -> RecordResult<Box<dyn RingItem>> {
        typed_from_frame::<F>(Frame::from_bytes(F::VERSION, item.as_bytes())?)
    }

    fn ring_item_from_frame(&self, frame: Frame, config: &ReaderConfig) -> RecordResult<Box<dyn RingItem>> {
        let frame = if frame.version() == F::VERSION {
            frame
        } else {
            Frame::from_bytes(F::VERSION, frame.as_bytes())?
        };
        if config.typed {
            typed_from_frame::<F>(frame)
        } else {
            Ok(Box::new(GenericItem::<F>::from_frame(frame)))
        }
    }

    fn make_abnormal_end(&self) -> RecordResult<Box<dyn AbnormalEndItem>> {
        Ok(Box::new(AbnormalEnd::<F>::new()?))
    }

    fn abnormal_end_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn AbnormalEndItem>> {
        Ok(Box::new(AbnormalEnd::<F>::from_item(item)?))
    }

    fn make_data_format(&self) -> RecordResult<Box<dyn DataFormatItem>> {
        Ok(Box::new(DataFormat::<F>::new()?))
    }

    fn data_format_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn DataFormatItem>> {
        Ok(Box::new(DataFormat::<F>::from_item(item)?))
    }

    fn make_glom_parameters(
        &self,
        coincidence_ticks: u64,
        is_building: bool,
        policy: GlomPolicy,
    ) -> RecordResult<Box<dyn GlomParametersItem>> {
        Ok(Box::new(GlomParameters::<F>::new(
            coincidence_ticks,
            is_building,
            policy,
        )?))
    }

    fn glom_parameters_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn GlomParametersItem>> {
        Ok(Box::new(GlomParameters::<F>::from_item(item)?))
    }

    fn make_physics_event(&self, max_body: usize) -> RecordResult<Box<dyn PhysicsEventItem>> {
        Ok(Box::new(PhysicsEvent::<F>::new(max_body)?))
    }

    fn make_physics_event_with_body_header(
        &self,
        header: BodyHeader,
        max_body: usize,
    ) -> RecordResult<Box<dyn PhysicsEventItem>> {
        Ok(Box::new(PhysicsEvent::<F>::with_body_header(header, max_body)?))
    }

    fn physics_event_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn PhysicsEventItem>> {
        Ok(Box::new(PhysicsEvent::<F>::from_item(item)?))
    }

    fn make_event_count(&self, params: &EventCountParams) -> RecordResult<Box<dyn PhysicsEventCountItem>> {
        Ok(Box::new(PhysicsEventCount::<F>::new(params)?))
    }

    fn event_count_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn PhysicsEventCountItem>> {
        Ok(Box::new(PhysicsEventCount::<F>::from_item(item)?))
    }

    fn make_fragment(&self, tag: BodyHeader, payload: &[u8]) -> RecordResult<Box<dyn FragmentItem>> {
        Ok(Box::new(Fragment::<F>::new(tag, payload)?))
    }

    fn make_unknown_fragment(&self, tag: BodyHeader, payload: &[u8]) -> RecordResult<Box<dyn FragmentItem>> {
        Ok(Box::new(Fragment::<F>::unknown_payload(tag, payload)?))
    }

    fn fragment_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn FragmentItem>> {
        Ok(Box::new(Fragment::<F>::known_from_item(item)?))
    }

    fn unknown_fragment_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn FragmentItem>> {
        Ok(Box::new(Fragment::<F>::unknown_from_item(item)?))
    }

    fn make_scaler(&self, params: &ScalerParams) -> RecordResult<Box<dyn ScalerItem>> {
        Ok(Box::new(Scaler::<F>::new(params)?))
    }

    fn scaler_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn ScalerItem>> {
        Ok(Box::new(Scaler::<F>::from_item(item)?))
    }

    fn make_state_change(&self, params: &StateChangeParams) -> RecordResult<Box<dyn StateChangeItem>> {
        Ok(Box::new(StateChange::<F>::new(params)?))
    }

    fn state_change_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn StateChangeItem>> {
        Ok(Box::new(StateChange::<F>::from_item(item)?))
    }

    fn make_text(&self, params: &TextParams) -> RecordResult<Box<dyn TextItem>> {
        Ok(Box::new(Text::<F>::new(params)?))
    }

    fn text_from(&self, item: &dyn RingItem) -> RecordResult<Box<dyn TextItem>> {
        Ok(Box::new(Text::<F>::from_item(item)?))
    }
}
