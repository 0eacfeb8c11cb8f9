//! Property-based test generators using proptest.
//!
//! Strategies only produce inputs every generation accepts: strings never
//! contain NUL and titles fit the title field.

use proptest::prelude::*;
use ringitem_core::{BodyHeader, FormatVersion, GlomPolicy};

/// Strategy for picking a protocol generation.
pub fn format_version_strategy() -> impl Strategy<Value = FormatVersion> {
    prop::sample::select(FormatVersion::ALL.to_vec())
}

/// Strategy for picking a generation that carries body headers.
pub fn body_header_version_strategy() -> impl Strategy<Value = FormatVersion> {
    prop::sample::select(vec![FormatVersion::V11, FormatVersion::V12])
}

/// Strategy for arbitrary body headers.
pub fn body_header_strategy() -> impl Strategy<Value = BodyHeader> {
    (any::<u64>(), any::<u32>(), any::<u32>())
        .prop_map(|(timestamp, source_id, barrier)| BodyHeader::new(timestamp, source_id, barrier))
}

/// Strategy for scaler counter vectors of the sizes that matter:
/// empty, single, typical and large.
pub fn scaler_values_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::sample::select(vec![0usize, 1, 16, 1024])
        .prop_flat_map(|len| prop::collection::vec(any::<u32>(), len))
}

/// Strategy for a set of documentation strings.
pub fn text_strings_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex("[ -~]{0,24}").expect("Invalid regex"),
        0..8,
    )
}

/// Strategy for run titles that fit the title field.
pub fn title_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _-]{0,80}").expect("Invalid regex")
}

/// Strategy for opaque event payloads.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for event building timestamp policies.
pub fn glom_policy_strategy() -> impl Strategy<Value = GlomPolicy> {
    prop_oneof![
        Just(GlomPolicy::First),
        Just(GlomPolicy::Last),
        Just(GlomPolicy::Average),
    ]
}

/// Cases per property when each case builds whole records.
pub const RECORD_CASES: u32 = 32;

/// Property test configuration running `cases` cases with shrinking
/// capped to match.
#[must_use]
pub fn record_test_config(cases: u32) -> ProptestConfig {
    ProptestConfig {
        max_shrink_iters: cases.saturating_mul(4),
        ..ProptestConfig::with_cases(cases)
    }
}
