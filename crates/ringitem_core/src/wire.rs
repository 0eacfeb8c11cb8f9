//! Compile-time protocol generation markers.
//!
//! Concrete record types are generic over a [`WireFormat`] marker, so
//! `Scaler<V11>` and `Scaler<V12>` are distinct types that share one
//! implementation driven by the generation's layout table.

use ringitem_format::{BodyLayouts, FormatVersion};
use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// A protocol generation known at compile time.
///
/// This trait is sealed; the only implementors are [`V10`], [`V11`] and
/// [`V12`].
pub trait WireFormat:
    sealed::Sealed + Copy + Default + fmt::Debug + Send + Sync + 'static
{
    /// The runtime value of this generation.
    const VERSION: FormatVersion;

    /// Body layouts of this generation.
    #[must_use]
    fn layouts() -> &'static BodyLayouts {
        Self::VERSION.layouts()
    }
}

macro_rules! wire_format {
    ($name:ident, $version:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl sealed::Sealed for $name {}

        impl WireFormat for $name {
            const VERSION: FormatVersion = $version;
        }
    };
}

wire_format!(V10, FormatVersion::V10, "Marker for the v10 generation.");
wire_format!(V11, FormatVersion::V11, "Marker for the v11 generation.");
wire_format!(V12, FormatVersion::V12, "Marker for the v12 generation.");
