//! Test fixtures and record helpers.
//!
//! Sample records use fixed timestamps so their bytes are reproducible.

use ringitem_core::item_type::PACKET_TYPES;
use ringitem_core::{
    BodyHeader, EventCountParams, GlomPolicy, RingItem, RingItemFactory, ScalerParams,
    StateChangeParams, StateChangeReason, TextParams,
};
use ringitem_transport::{FileSink, FileSource};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Wall clock timestamp stamped into every fixture record.
pub const FIXED_TIMESTAMP: u32 = 1_700_000_000;

/// Installs a test-friendly tracing subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The body header used by fixture records.
#[must_use]
pub fn fixed_body_header() -> BodyHeader {
    BodyHeader::new(0x0102_0304_0506_0708, 5, 0)
}

/// One record of every kind `factory`'s generation defines, typed.
///
/// Generations with body headers also get a stamped physics event.
pub fn sample_records(factory: &dyn RingItemFactory) -> Vec<Box<dyn RingItem>> {
    let version = factory.version();
    let mut records = Vec::new();

    let state = factory
        .make_state_change(
            &StateChangeParams::new(StateChangeReason::Begin, 42, "fixture run")
                .timestamp(FIXED_TIMESTAMP),
        )
        .expect("Failed to build state change");
    records.push(state.as_bytes().to_vec());

    let scaler = factory
        .make_scaler(&ScalerParams::new(10, 20, vec![1, 2, 3, 4]).timestamp(FIXED_TIMESTAMP))
        .expect("Failed to build scaler");
    records.push(scaler.as_bytes().to_vec());

    let text = factory
        .make_text(&TextParams::new(PACKET_TYPES, ["alpha", "beta"]).timestamp(FIXED_TIMESTAMP))
        .expect("Failed to build text");
    records.push(text.as_bytes().to_vec());

    let count = factory
        .make_event_count(&EventCountParams::new(1234).timestamp(FIXED_TIMESTAMP))
        .expect("Failed to build event count");
    records.push(count.as_bytes().to_vec());

    let mut event = factory
        .make_physics_event(16)
        .expect("Failed to build physics event");
    event
        .append_body(&(0u8..16).collect::<Vec<_>>())
        .expect("Failed to fill physics event");
    records.push(event.as_bytes().to_vec());

    let fragment = factory
        .make_fragment(fixed_body_header(), b"fragment")
        .expect("Failed to build fragment");
    records.push(fragment.as_bytes().to_vec());

    if version.supports_body_headers() {
        let mut stamped = factory
            .make_physics_event_with_body_header(fixed_body_header(), 4)
            .expect("Failed to build stamped physics event");
        stamped
            .append_body(&[9, 9, 9, 9])
            .expect("Failed to fill stamped physics event");
        records.push(stamped.as_bytes().to_vec());
    }

    if version.supports_format_items() {
        let format = factory.make_data_format().expect("Failed to build data format");
        records.push(format.as_bytes().to_vec());
        let glom = factory
            .make_glom_parameters(100, true, GlomPolicy::Average)
            .expect("Failed to build glom parameters");
        records.push(glom.as_bytes().to_vec());
        let abnormal = factory.make_abnormal_end().expect("Failed to build abnormal end");
        records.push(abnormal.as_bytes().to_vec());
    }

    records
        .iter()
        .map(|bytes| {
            let generic = factory
                .ring_item_from_bytes(bytes)
                .expect("Failed to copy fixture record");
            factory
                .make_typed(generic.as_ref())
                .expect("Failed to type fixture record")
        })
        .collect()
}

/// A temporary event file, removed on drop.
pub struct RecordFile {
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl RecordFile {
    /// Creates an empty event file in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("run.evt");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the event file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file's contents with `records`.
    pub fn write_records(&self, factory: &dyn RingItemFactory, records: &[Box<dyn RingItem>]) {
        let mut sink = FileSink::create(&self.path).expect("Failed to create event file");
        for record in records {
            factory
                .put_ring_item(record.as_ref(), &mut sink)
                .expect("Failed to write record");
        }
    }

    /// Reads every record in the file.
    pub fn read_records(&self, factory: &dyn RingItemFactory) -> Vec<Box<dyn RingItem>> {
        let mut source = FileSource::open(&self.path).expect("Failed to open event file");
        let mut records = Vec::new();
        while let Some(record) = factory
            .get_ring_item(&mut source)
            .expect("Failed to read record")
        {
            records.push(record);
        }
        records
    }
}

impl Default for RecordFile {
    fn default() -> Self {
        Self::new()
    }
}
