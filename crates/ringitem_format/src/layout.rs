//! Per-generation body layout tables.
//!
//! Offsets are relative to the start of the record body (after the header
//! and body header slot). Fields marked `Option` do not exist in every
//! generation.

use crate::version::FormatVersion;

/// Longest run title, in bytes.
pub const TITLE_MAXSIZE: usize = 80;

/// Size of the NUL padded title field.
pub const TITLE_FIELD_SIZE: usize = TITLE_MAXSIZE + 1;

/// Run state change body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChangeLayout {
    /// Run number.
    pub run_number: usize,
    /// Time offset into the run, in divisor ticks.
    pub time_offset: usize,
    /// Wall clock time (`u32` seconds since the epoch).
    pub timestamp: usize,
    /// Ticks per second for `time_offset`.
    pub offset_divisor: Option<usize>,
    /// Source id of the producer, preserved through event building.
    pub original_source_id: Option<usize>,
    /// Title field.
    pub title: usize,
}

impl StateChangeLayout {
    /// Size of the whole body.
    #[must_use]
    pub const fn body_size(&self) -> usize {
        self.title + TITLE_FIELD_SIZE
    }
}

/// Periodic scaler body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalerLayout {
    /// Start of the counting interval, in divisor ticks.
    pub interval_start: usize,
    /// End of the counting interval, in divisor ticks.
    pub interval_end: usize,
    /// Wall clock time.
    pub timestamp: usize,
    /// Ticks per second for the interval offsets.
    pub interval_divisor: Option<usize>,
    /// Number of scaler values.
    pub scaler_count: usize,
    /// Non-zero if values are increments since the last readout.
    pub is_incremental: Option<usize>,
    /// Producer source id.
    pub original_source_id: Option<usize>,
    /// First scaler value.
    pub scalers: usize,
}

impl ScalerLayout {
    /// Size of the fixed part of the body.
    #[must_use]
    pub const fn fixed_size(&self) -> usize {
        self.scalers
    }
}

/// Documentation (string list) body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    /// Time offset into the run, in divisor ticks.
    pub time_offset: usize,
    /// Wall clock time.
    pub timestamp: usize,
    /// Ticks per second for `time_offset`.
    pub offset_divisor: Option<usize>,
    /// Producer source id.
    pub original_source_id: Option<usize>,
    /// Number of strings.
    pub string_count: usize,
    /// First string.
    pub strings: usize,
}

impl TextLayout {
    /// Size of the fixed part of the body.
    #[must_use]
    pub const fn fixed_size(&self) -> usize {
        self.strings
    }
}

/// Physics event count body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCountLayout {
    /// Time offset into the run, in divisor ticks.
    pub time_offset: usize,
    /// Wall clock time.
    pub timestamp: usize,
    /// Ticks per second for `time_offset`.
    pub offset_divisor: Option<usize>,
    /// Producer source id.
    pub original_source_id: Option<usize>,
    /// Event count (`u64`).
    pub event_count: usize,
}

impl EventCountLayout {
    /// Size of the whole body.
    #[must_use]
    pub const fn body_size(&self) -> usize {
        self.event_count + 8
    }
}

/// Event builder fragment whose tag lives in the body (v10 only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedFragmentLayout {
    /// Event timestamp (`u64`).
    pub timestamp: usize,
    /// Source id.
    pub source_id: usize,
    /// Payload size in bytes.
    pub payload_size: usize,
    /// Barrier type.
    pub barrier_type: usize,
    /// First payload byte.
    pub payload: usize,
}

/// Format declaration body: major then minor, both `u16`.
pub mod data_format {
    /// Major version.
    pub const MAJOR: usize = 0;
    /// Minor version.
    pub const MINOR: usize = 2;
    /// Body size.
    pub const BODY_SIZE: usize = 4;
}

/// Glom parameter body.
pub mod glom {
    /// Coincidence interval in timestamp ticks (`u64`).
    pub const COINCIDENCE_TICKS: usize = 0;
    /// Non-zero when glom is building events (`u16`).
    pub const IS_BUILDING: usize = 8;
    /// Timestamp policy (`u16`).
    pub const TIMESTAMP_POLICY: usize = 10;
    /// Body size.
    pub const BODY_SIZE: usize = 12;
}

/// All variable layouts of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLayouts {
    /// Run state change.
    pub state_change: StateChangeLayout,
    /// Periodic scalers.
    pub scaler: ScalerLayout,
    /// Documentation strings.
    pub text: TextLayout,
    /// Physics event count.
    pub event_count: EventCountLayout,
    /// Fragment tag embedded in the body, when the generation has no body
    /// headers.
    pub embedded_fragment: Option<EmbeddedFragmentLayout>,
}

static V10_LAYOUTS: BodyLayouts = BodyLayouts {
    state_change: StateChangeLayout {
        run_number: 0,
        time_offset: 4,
        timestamp: 8,
        offset_divisor: None,
        original_source_id: None,
        title: 12,
    },
    scaler: ScalerLayout {
        interval_start: 0,
        interval_end: 4,
        timestamp: 8,
        interval_divisor: None,
        scaler_count: 12,
        is_incremental: None,
        original_source_id: None,
        scalers: 16,
    },
    text: TextLayout {
        time_offset: 0,
        timestamp: 4,
        offset_divisor: None,
        original_source_id: None,
        string_count: 8,
        strings: 12,
    },
    event_count: EventCountLayout {
        time_offset: 0,
        timestamp: 4,
        offset_divisor: None,
        original_source_id: None,
        event_count: 8,
    },
    embedded_fragment: Some(EmbeddedFragmentLayout {
        timestamp: 0,
        source_id: 8,
        payload_size: 12,
        barrier_type: 16,
        payload: 20,
    }),
};

static V11_LAYOUTS: BodyLayouts = BodyLayouts {
    state_change: StateChangeLayout {
        run_number: 0,
        time_offset: 4,
        timestamp: 8,
        offset_divisor: Some(12),
        original_source_id: None,
        title: 16,
    },
    scaler: ScalerLayout {
        interval_start: 0,
        interval_end: 4,
        timestamp: 8,
        interval_divisor: Some(12),
        scaler_count: 16,
        is_incremental: Some(20),
        original_source_id: None,
        scalers: 24,
    },
    text: TextLayout {
        time_offset: 0,
        timestamp: 4,
        offset_divisor: Some(8),
        original_source_id: None,
        string_count: 12,
        strings: 16,
    },
    event_count: EventCountLayout {
        time_offset: 0,
        timestamp: 4,
        offset_divisor: Some(8),
        original_source_id: None,
        event_count: 12,
    },
    embedded_fragment: None,
};

static V12_LAYOUTS: BodyLayouts = BodyLayouts {
    state_change: StateChangeLayout {
        run_number: 0,
        time_offset: 4,
        timestamp: 8,
        offset_divisor: Some(12),
        original_source_id: Some(16),
        title: 20,
    },
    scaler: ScalerLayout {
        interval_start: 0,
        interval_end: 4,
        timestamp: 8,
        interval_divisor: Some(12),
        scaler_count: 16,
        is_incremental: Some(20),
        original_source_id: Some(24),
        scalers: 28,
    },
    text: TextLayout {
        time_offset: 0,
        timestamp: 4,
        offset_divisor: Some(8),
        original_source_id: Some(12),
        string_count: 16,
        strings: 20,
    },
    event_count: EventCountLayout {
        time_offset: 0,
        timestamp: 4,
        offset_divisor: Some(8),
        original_source_id: Some(12),
        event_count: 16,
    },
    embedded_fragment: None,
};

impl FormatVersion {
    /// Body layouts for this generation.
    #[must_use]
    pub fn layouts(self) -> &'static BodyLayouts {
        match self {
            Self::V10 => &V10_LAYOUTS,
            Self::V11 => &V11_LAYOUTS,
            Self::V12 => &V12_LAYOUTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_sizes() {
        assert_eq!(FormatVersion::V10.layouts().state_change.body_size(), 93);
        assert_eq!(FormatVersion::V11.layouts().state_change.body_size(), 97);
        assert_eq!(FormatVersion::V12.layouts().state_change.body_size(), 101);
        assert_eq!(FormatVersion::V10.layouts().event_count.body_size(), 16);
        assert_eq!(FormatVersion::V12.layouts().event_count.body_size(), 24);
    }

    #[test]
    fn only_v10_embeds_fragment_tags() {
        assert!(FormatVersion::V10.layouts().embedded_fragment.is_some());
        assert!(FormatVersion::V11.layouts().embedded_fragment.is_none());
        assert!(FormatVersion::V12.layouts().embedded_fragment.is_none());
    }

    #[test]
    fn original_source_id_only_in_v12() {
        for version in [FormatVersion::V10, FormatVersion::V11] {
            let l = version.layouts();
            assert!(l.scaler.original_source_id.is_none());
            assert!(l.text.original_source_id.is_none());
        }
        let l = FormatVersion::V12.layouts();
        assert!(l.state_change.original_source_id.is_some());
        assert!(l.event_count.original_source_id.is_some());
    }
}
