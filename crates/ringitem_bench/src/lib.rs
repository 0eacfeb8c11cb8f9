//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;
use ringitem_core::item_type::PHYSICS_EVENT;
use ringitem_core::{RingItem, RingItemFactory, ScalerParams};

/// Generate random payload bytes of the specified size.
pub fn random_payload(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` random scaler counters.
pub fn random_scalers(count: usize) -> Vec<u32> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen()).collect()
}

/// Build `count` physics events carrying `payload_size` random bytes each.
pub fn generate_events(
    factory: &dyn RingItemFactory,
    count: usize,
    payload_size: usize,
) -> Vec<Box<dyn RingItem>> {
    (0..count)
        .map(|_| {
            let mut item = factory
                .make_ring_item(PHYSICS_EVENT, payload_size)
                .expect("Failed to build physics event");
            item.append_body(&random_payload(payload_size))
                .expect("Failed to fill physics event");
            item
        })
        .collect()
}

/// Scaler parameters with `count` random counters.
pub fn scaler_params(count: usize) -> ScalerParams {
    ScalerParams::new(0, 10, random_scalers(count))
}
