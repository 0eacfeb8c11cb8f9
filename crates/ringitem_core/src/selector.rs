//! Process-wide factory selection.
//!
//! Factories are created on first request and cached for the life of the
//! process, so every caller asking for a generation shares one instance.
//! Lookups hand out `Arc`s: clearing the cache never invalidates a
//! factory someone is still holding.

use crate::error::{RecordError, RecordResult};
use crate::factory::{Factory, RingItemFactory};
use crate::item::RingItem;
use crate::kinds::DataFormatItem;
use crate::wire::{V10, V11, V12};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use ringitem_format::item_type::RING_FORMAT;
use ringitem_format::{format_declaration_version, FormatVersion};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

static FACTORIES: Lazy<Mutex<HashMap<FormatVersion, Arc<dyn RingItemFactory>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn create(version: FormatVersion) -> Arc<dyn RingItemFactory> {
    match version {
        FormatVersion::V10 => Arc::new(Factory::<V10>::new()),
        FormatVersion::V11 => Arc::new(Factory::<V11>::new()),
        FormatVersion::V12 => Arc::new(Factory::<V12>::new()),
    }
}

/// Returns the shared factory for `version`, creating it on first use.
pub fn select_factory(version: FormatVersion) -> Arc<dyn RingItemFactory> {
    let mut factories = FACTORIES.lock();
    Arc::clone(factories.entry(version).or_insert_with(|| {
        debug!(%version, "creating record factory");
        create(version)
    }))
}

/// Returns the shared factory for a major version number.
///
/// # Errors
///
/// Returns [`RecordError::InvalidVersion`] if no generation has that
/// major number.
pub fn select_factory_for_major(major: u32) -> RecordResult<Arc<dyn RingItemFactory>> {
    let version =
        FormatVersion::from_major(major).map_err(|_| RecordError::InvalidVersion { major })?;
    Ok(select_factory(version))
}

/// Returns the factory for the generation a format declaration announces.
///
/// # Errors
///
/// Returns [`RecordError::InvalidVersion`] for an unknown major number.
pub fn select_factory_for_format(item: &dyn DataFormatItem) -> RecordResult<Arc<dyn RingItemFactory>> {
    select_factory_for_major(u32::from(item.major()))
}

/// Returns the factory for the generation a raw format declaration
/// announces.
///
/// The major number is read straight from the record's bytes, so the
/// record may have been read with any factory.
///
/// # Errors
///
/// Returns [`RecordError::WrongKind`] if `item` is not a format declaration,
/// [`RecordError::Format`] if its body is truncated and
/// [`RecordError::InvalidVersion`] for an unknown major number.
pub fn select_factory_for_record(item: &dyn RingItem) -> RecordResult<Arc<dyn RingItemFactory>> {
    if item.item_type() != RING_FORMAT {
        return Err(RecordError::wrong_kind("data format", item.item_type()));
    }
    let (major, _minor) = format_declaration_version(item.as_bytes())?;
    select_factory_for_major(u32::from(major))
}

/// Drops every cached factory.
///
/// Intended for tests. Factories already handed out stay usable; later
/// lookups create fresh instances.
pub fn clear_cache() {
    let mut factories = FACTORIES.lock();
    debug!(count = factories.len(), "clearing record factory cache");
    factories.clear();
}

/// Generations that currently have a cached factory, in ascending order.
pub fn cached_versions() -> Vec<FormatVersion> {
    let mut versions: Vec<_> = FACTORIES.lock().keys().copied().collect();
    versions.sort();
    versions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn repeated_lookups_share_one_instance() {
        clear_cache();
        let first = select_factory(FormatVersion::V11);
        let second = select_factory(FormatVersion::V11);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cached_versions(), vec![FormatVersion::V11]);
    }

    #[test]
    #[serial]
    fn clear_cache_creates_fresh_instances() {
        let before = select_factory(FormatVersion::V12);
        clear_cache();
        assert!(cached_versions().is_empty());
        let after = select_factory(FormatVersion::V12);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.version(), after.version());
        assert!(before.make_data_format().is_ok());
    }

    #[test]
    #[serial]
    fn major_numbers() {
        assert_eq!(select_factory_for_major(10).unwrap().version(), FormatVersion::V10);
        assert_eq!(select_factory_for_major(12).unwrap().version(), FormatVersion::V12);
        assert!(matches!(
            select_factory_for_major(13),
            Err(RecordError::InvalidVersion { major: 13 })
        ));
    }

    #[test]
    #[serial]
    fn format_declarations_select_their_generation() {
        let declaration = select_factory(FormatVersion::V11).make_data_format().unwrap();
        let factory = select_factory_for_format(declaration.as_ref()).unwrap();
        assert_eq!(factory.version(), FormatVersion::V11);

        // v10 frames have no body header slot, so any declaration parses.
        let raw = select_factory(FormatVersion::V10)
            .ring_item_from_bytes(declaration.as_bytes())
            .unwrap();
        assert_eq!(raw.version(), FormatVersion::V10);
        let factory = select_factory_for_record(raw.as_ref()).unwrap();
        assert!(Arc::ptr_eq(&factory, &select_factory(FormatVersion::V11)));
    }

    #[test]
    #[serial]
    fn foreign_body_header_markers_are_rejected() {
        let declaration = select_factory(FormatVersion::V11).make_data_format().unwrap();
        assert!(select_factory(FormatVersion::V12)
            .ring_item_from_bytes(declaration.as_bytes())
            .is_err());
    }

    #[test]
    #[serial]
    fn raw_lookup_rejects_other_kinds() {
        let item = select_factory(FormatVersion::V12).make_ring_item(30, 0).unwrap();
        assert!(matches!(
            select_factory_for_record(item.as_ref()),
            Err(RecordError::WrongKind { actual: 30, .. })
        ));
    }
}
