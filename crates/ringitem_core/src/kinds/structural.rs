//! Stream bookkeeping records introduced with v11: abnormal run ends,
//! format declarations and event building parameters.
//!
//! None of these kinds carry body headers, and v10 does not define them.

use super::{expect_type, reparse};
use crate::error::{RecordError, RecordResult};
use crate::frame::Frame;
use crate::item::{describe_header, AsRingItem, RingItem};
use crate::wire::WireFormat;
use ringitem_format::item_type::{ABNORMAL_ENDRUN, EVB_GLOM_INFO, RING_FORMAT};
use ringitem_format::layout::{data_format, glom};
use ringitem_format::BodyHeader;
use std::fmt::Write as _;
use std::marker::PhantomData;

fn require_format_items<F: WireFormat>(kind: &'static str) -> RecordResult<()> {
    if F::VERSION.supports_format_items() {
        Ok(())
    } else {
        Err(RecordError::unsupported(F::VERSION, kind))
    }
}

macro_rules! bookkeeping_item {
    ($name:ident, $body_size:expr) => {
        impl<F: WireFormat> $name<F> {
            fn wrap(frame: Frame) -> Self {
                Self {
                    frame,
                    _format: PhantomData,
                }
            }
        }

        impl<F: WireFormat> RingItem for $name<F> {
            fn frame(&self) -> &Frame {
                &self.frame
            }

            fn frame_mut(&mut self) -> &mut Frame {
                &mut self.frame
            }

            fn fixed_body_size(&self) -> usize {
                $body_size
            }

            fn set_body_header(&mut self, _header: BodyHeader) -> RecordResult<()> {
                Err(RecordError::NoBodyHeader {
                    item_type: self.item_type(),
                })
            }

            fn describe(&self) -> String {
                let mut out = describe_header(self);
                self.describe_fields(&mut out);
                out
            }
        }
    };
}

/// Marks a run that ended without an end run record.
pub trait AbnormalEndItem: RingItem + AsRingItem {}

/// An abnormal end of run record. The body is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbnormalEnd<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> AbnormalEnd<F> {
    /// Builds an abnormal end record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Unsupported`] under v10.
    pub fn new() -> RecordResult<Self> {
        require_format_items::<F>("abnormal end")?;
        Frame::new(F::VERSION, ABNORMAL_ENDRUN, 0).map(Self::wrap)
    }

    /// Views an existing record as an abnormal end.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Unsupported`] under v10 and
    /// [`RecordError::WrongKind`] if `item` is not an abnormal end.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        require_format_items::<F>("abnormal end")?;
        Self::from_frame(reparse(
            F::VERSION,
            item,
            |code| code == ABNORMAL_ENDRUN,
            "abnormal end",
        )?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, |code| code == ABNORMAL_ENDRUN, "abnormal end")?;
        Ok(Self::wrap(frame))
    }

    fn describe_fields(&self, _out: &mut String) {}
}

bookkeeping_item!(AbnormalEnd, 0);

impl<F: WireFormat> AbnormalEndItem for AbnormalEnd<F> {}

/// Accessors for format declarations.
pub trait DataFormatItem: RingItem + AsRingItem {
    /// Major format version declared for the records that follow.
    fn major(&self) -> u16;
    /// Minor format version.
    fn minor(&self) -> u16;
}

/// A format declaration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFormat<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> DataFormat<F> {
    /// Builds a record declaring this generation.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Unsupported`] under v10.
    pub fn new() -> RecordResult<Self> {
        require_format_items::<F>("data format")?;
        let mut frame = Frame::new(F::VERSION, RING_FORMAT, data_format::BODY_SIZE)?;
        frame.put_u16(F::VERSION.major())?;
        frame.put_u16(F::VERSION.minor())?;
        frame.update_size();
        Ok(Self::wrap(frame))
    }

    /// Views an existing record as a format declaration.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Unsupported`] under v10,
    /// [`RecordError::WrongKind`] if `item` is not a format declaration and
    /// [`RecordError::Malformed`] if its body is too short.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        require_format_items::<F>("data format")?;
        Self::from_frame(reparse(
            F::VERSION,
            item,
            |code| code == RING_FORMAT,
            "data format",
        )?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, |code| code == RING_FORMAT, "data format")?;
        frame.require_body(data_format::BODY_SIZE, "data format")?;
        Ok(Self::wrap(frame))
    }

    fn describe_fields(&self, out: &mut String) {
        let _ = writeln!(out, "Format version: {}.{}", self.major(), self.minor());
    }
}

bookkeeping_item!(DataFormat, data_format::BODY_SIZE);

impl<F: WireFormat> DataFormatItem for DataFormat<F> {
    fn major(&self) -> u16 {
        self.frame.body_u16(data_format::MAJOR)
    }

    fn minor(&self) -> u16 {
        self.frame.body_u16(data_format::MINOR)
    }
}

/// How the event builder assigns a timestamp to a built event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlomPolicy {
    /// Timestamp of the first fragment.
    #[default]
    First,
    /// Timestamp of the last fragment.
    Last,
    /// Average of the fragment timestamps.
    Average,
}

impl GlomPolicy {
    /// Wire code of the policy.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::First => 0,
            Self::Last => 1,
            Self::Average => 2,
        }
    }
}

impl TryFrom<u16> for GlomPolicy {
    type Error = RecordError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::First),
            1 => Ok(Self::Last),
            2 => Ok(Self::Average),
            other => Err(RecordError::malformed(format!(
                "unknown glom timestamp policy {other}"
            ))),
        }
    }
}

/// Accessors for event building parameters.
pub trait GlomParametersItem: RingItem + AsRingItem {
    /// Coincidence window in timestamp ticks.
    fn coincidence_ticks(&self) -> u64;
    /// Whether fragments are being built into events at all.
    fn is_building(&self) -> bool;
    /// Timestamp assignment policy.
    fn timestamp_policy(&self) -> GlomPolicy;
}

/// An event building parameters record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlomParameters<F: WireFormat> {
    frame: Frame,
    _format: PhantomData<F>,
}

impl<F: WireFormat> GlomParameters<F> {
    /// Builds an event building parameters record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Unsupported`] under v10.
    pub fn new(coincidence_ticks: u64, is_building: bool, policy: GlomPolicy) -> RecordResult<Self> {
        require_format_items::<F>("glom parameters")?;
        let mut frame = Frame::new(F::VERSION, EVB_GLOM_INFO, glom::BODY_SIZE)?;
        frame.put_u64(coincidence_ticks)?;
        frame.put_u16(u16::from(is_building))?;
        frame.put_u16(policy.code())?;
        frame.update_size();
        Ok(Self::wrap(frame))
    }

    /// Views an existing record as event building parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Unsupported`] under v10,
    /// [`RecordError::WrongKind`] for another kind and
    /// [`RecordError::Malformed`] for a short body or unknown policy.
    pub fn from_item(item: &dyn RingItem) -> RecordResult<Self> {
        require_format_items::<F>("glom parameters")?;
        Self::from_frame(reparse(
            F::VERSION,
            item,
            |code| code == EVB_GLOM_INFO,
            "glom parameters",
        )?)
    }

    pub(crate) fn from_frame(frame: Frame) -> RecordResult<Self> {
        expect_type(&frame, |code| code == EVB_GLOM_INFO, "glom parameters")?;
        frame.require_body(glom::BODY_SIZE, "glom parameters")?;
        GlomPolicy::try_from(frame.body_u16(glom::TIMESTAMP_POLICY))?;
        Ok(Self::wrap(frame))
    }

    fn describe_fields(&self, out: &mut String) {
        let _ = writeln!(out, "Coincidence window: {} ticks", self.coincidence_ticks());
        let _ = writeln!(out, "Building: {}", self.is_building());
        let _ = writeln!(out, "Timestamp policy: {:?}", self.timestamp_policy());
    }
}

bookkeeping_item!(GlomParameters, glom::BODY_SIZE);

impl<F: WireFormat> GlomParametersItem for GlomParameters<F> {
    fn coincidence_ticks(&self) -> u64 {
        self.frame.body_u64(glom::COINCIDENCE_TICKS)
    }

    fn is_building(&self) -> bool {
        self.frame.body_u16(glom::IS_BUILDING) != 0
    }

    fn timestamp_policy(&self) -> GlomPolicy {
        GlomPolicy::try_from(self.frame.body_u16(glom::TIMESTAMP_POLICY)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::GenericItem;
    use crate::wire::{V10, V11, V12};

    #[test]
    fn v10_does_not_define_bookkeeping_kinds() {
        assert!(matches!(
            AbnormalEnd::<V10>::new(),
            Err(RecordError::Unsupported { kind: "abnormal end", .. })
        ));
        assert!(matches!(
            DataFormat::<V10>::new(),
            Err(RecordError::Unsupported { .. })
        ));
        assert!(matches!(
            GlomParameters::<V10>::new(1, true, GlomPolicy::Last),
            Err(RecordError::Unsupported { .. })
        ));
    }

    #[test]
    fn data_format_declares_its_generation() {
        let v11 = DataFormat::<V11>::new().unwrap();
        let v12 = DataFormat::<V12>::new().unwrap();
        assert_eq!((v11.major(), v11.minor()), (11, 0));
        assert_eq!((v12.major(), v12.minor()), (12, 0));
        assert_eq!(v12.size(), 16);
        assert_eq!(
            ringitem_format::format_declaration_version(v12.as_bytes()).unwrap(),
            (12, 0)
        );
    }

    #[test]
    fn glom_fields() {
        let item = GlomParameters::<V12>::new(500, true, GlomPolicy::Average).unwrap();
        assert_eq!(item.coincidence_ticks(), 500);
        assert!(item.is_building());
        assert_eq!(item.timestamp_policy(), GlomPolicy::Average);
        assert_eq!(item.size(), 12 + 12);
    }

    #[test]
    fn glom_rejects_unknown_policy() {
        let item = GlomParameters::<V11>::new(1, false, GlomPolicy::First).unwrap();
        let mut bytes = item.as_bytes().to_vec();
        let at = 12 + glom::TIMESTAMP_POLICY;
        bytes[at..at + 2].copy_from_slice(&7u16.to_le_bytes());
        let generic = GenericItem::<V11>::from_bytes(&bytes).unwrap();
        assert!(GlomParameters::<V11>::from_item(&generic).is_err());
    }

    #[test]
    fn bookkeeping_kinds_refuse_body_headers() {
        let mut item = AbnormalEnd::<V12>::new().unwrap();
        assert!(!item.has_body_header());
        assert_eq!(item.size(), 12);
        assert!(matches!(
            item.set_body_header(BodyHeader::new(1, 2, 3)),
            Err(RecordError::NoBodyHeader { item_type: 5 })
        ));
    }
}
