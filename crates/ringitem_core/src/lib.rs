//! # Ring Item Core
//!
//! Version-polymorphic records for data-acquisition ring buffers.
//!
//! Three protocol generations (v10, v11, v12) encode the same kinds of
//! record (run state changes, scalers, documentation strings, physics
//! events, event builder fragments and stream bookkeeping) with slightly
//! different binary layouts. This crate builds, reinterprets and
//! transfers records of every generation behind one set of object-safe
//! traits.
//!
//! ## Building Blocks
//!
//! - [`RingItem`] - the capabilities every record shares
//! - Kind traits such as [`ScalerItem`] and [`StateChangeItem`]
//! - [`RingItemFactory`] - builds all kinds for one generation
//! - [`select_factory`] - the shared factory for a runtime-chosen generation
//! - [`RecordStream`] - iterates a transport, following format declarations
//!
//! Concrete types are generic over a generation marker ([`V10`], [`V11`],
//! [`V12`]); the [`v10`], [`v11`] and [`v12`] modules name them directly.
//!
//! ## Example
//!
//! ```rust
//! use ringitem_core::{select_factory, BodyHeader, FormatVersion, ScalerParams};
//!
//! let factory = select_factory(FormatVersion::V12);
//! let params = ScalerParams::new(10, 20, vec![1, 2, 3])
//!     .interval_divisor(5)
//!     .body_header(BodyHeader::new(1000, 5, 0));
//! let scaler = factory.make_scaler(&params).unwrap();
//!
//! assert_eq!(scaler.compute_start_time(), 2.0);
//! assert_eq!(scaler.scaler(2).unwrap(), 3);
//! assert_eq!(scaler.original_source_id(), 5);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod config;
mod error;
mod factory;
mod frame;
mod io;
mod item;
mod kinds;
mod selector;
mod wire;

pub use buffer::{RecordBuffer, INLINE_CAPACITY};
pub use config::ReaderConfig;
pub use error::{RecordError, RecordResult};
pub use factory::{Factory, RingItemFactory};
pub use frame::Frame;
pub use io::{write_record, RecordStream};
pub use item::{AsRingItem, GenericItem, RingItem};
pub use kinds::{
    AbnormalEnd, AbnormalEndItem, DataFormat, DataFormatItem, EventCountParams, Fragment,
    FragmentItem, GlomParameters, GlomParametersItem, GlomPolicy, PhysicsEvent, PhysicsEventCount,
    PhysicsEventCountItem, PhysicsEventItem, Scaler, ScalerItem, ScalerParams, StateChange,
    StateChangeItem, StateChangeParams, StateChangeReason, Text, TextItem, TextParams,
};
pub use selector::{
    cached_versions, clear_cache, select_factory, select_factory_for_format,
    select_factory_for_major, select_factory_for_record,
};
pub use wire::{WireFormat, V10, V11, V12};

pub use ringitem_format::{item_type, BodyHeader, FormatVersion};

macro_rules! generation_aliases {
    ($module:ident, $marker:ident, $label:literal) => {
        #[doc = concat!("Concrete record types of format ", $label, ".")]
        pub mod $module {
            use crate::wire::$marker;

            /// The factory for this generation.
            pub type Factory = crate::Factory<$marker>;
            /// A record with no kind-specific view.
            pub type GenericItem = crate::GenericItem<$marker>;
            /// An abnormal end of run record.
            pub type AbnormalEnd = crate::AbnormalEnd<$marker>;
            /// A format declaration record.
            pub type DataFormat = crate::DataFormat<$marker>;
            /// An event building parameters record.
            pub type GlomParameters = crate::GlomParameters<$marker>;
            /// A physics event record.
            pub type PhysicsEvent = crate::PhysicsEvent<$marker>;
            /// A physics event count record.
            pub type PhysicsEventCount = crate::PhysicsEventCount<$marker>;
            /// An event builder fragment.
            pub type Fragment = crate::Fragment<$marker>;
            /// A periodic scaler record.
            pub type Scaler = crate::Scaler<$marker>;
            /// A run state change record.
            pub type StateChange = crate::StateChange<$marker>;
            /// A documentation record.
            pub type Text = crate::Text<$marker>;
        }
    };
}

generation_aliases!(v10, V10, "v10");
generation_aliases!(v11, V11, "v11");
generation_aliases!(v12, V12, "v12");
