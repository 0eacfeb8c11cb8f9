//! Process-wide factory selection seen from outside the core crate.

use ringitem_core::{
    cached_versions, clear_cache, select_factory, select_factory_for_format,
    select_factory_for_major, select_factory_for_record, FormatVersion, RecordError,
};
use serial_test::serial;
use std::sync::Arc;
use std::thread;

#[test]
#[serial]
fn selected_factories_declare_their_own_generation() {
    for major in [11u32, 12] {
        let factory = select_factory_for_major(major).unwrap();
        let declaration = factory.make_data_format().unwrap();
        assert_eq!(u32::from(declaration.major()), major);
        assert_eq!(declaration.minor(), 0);
        let again = select_factory_for_format(declaration.as_ref()).unwrap();
        assert!(Arc::ptr_eq(&factory, &again));
    }
}

#[test]
#[serial]
fn unknown_majors_are_rejected() {
    for major in [0u32, 9, 13, u32::MAX] {
        assert!(matches!(
            select_factory_for_major(major),
            Err(RecordError::InvalidVersion { major: m }) if m == major
        ));
    }
}

#[test]
#[serial]
fn threads_share_one_instance_per_generation() {
    clear_cache();
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| select_factory(FormatVersion::V12)))
        .collect();
    let factories: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for factory in &factories[1..] {
        assert!(Arc::ptr_eq(&factories[0], factory));
    }
    assert_eq!(cached_versions(), vec![FormatVersion::V12]);
}

#[test]
#[serial]
fn clearing_keeps_handed_out_factories_usable() {
    let held = select_factory(FormatVersion::V11);
    clear_cache();
    assert!(cached_versions().is_empty());

    let scaler = held
        .make_scaler(&ringitem_core::ScalerParams::new(0, 5, vec![1, 2]))
        .unwrap();
    assert_eq!(scaler.scaler_count(), 2);

    let fresh = select_factory(FormatVersion::V11);
    assert!(!Arc::ptr_eq(&held, &fresh));
    assert_eq!(held.version(), fresh.version());
}

#[test]
#[serial]
fn raw_declarations_select_across_generations() {
    let v12 = select_factory(FormatVersion::V12);
    let declaration = v12.make_data_format().unwrap();
    let foreign_view = select_factory(FormatVersion::V10)
        .ring_item_from_bytes(declaration.as_bytes())
        .unwrap();
    let selected = select_factory_for_record(foreign_view.as_ref()).unwrap();
    assert_eq!(selected.version(), FormatVersion::V12);
}
