//! Record construction and access benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringitem_bench::{generate_events, scaler_params};
use ringitem_core::{
    select_factory, BodyHeader, FormatVersion, StateChangeParams, StateChangeReason,
};

/// Benchmark scaler construction across counter counts.
fn bench_make_scaler(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_scaler");
    let factory = select_factory(FormatVersion::V12);

    for count in [1, 32, 1024].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let params = scaler_params(count);
            b.iter(|| {
                let scaler = factory.make_scaler(black_box(&params)).unwrap();
                black_box(scaler);
            });
        });
    }

    group.finish();
}

/// Benchmark state change construction for each generation.
fn bench_make_state_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_state_change");
    let params = StateChangeParams::new(StateChangeReason::Begin, 1, "benchmark run");

    for version in FormatVersion::ALL {
        let factory = select_factory(version);
        group.bench_function(version.to_string(), |b| {
            b.iter(|| {
                let item = factory.make_state_change(black_box(&params)).unwrap();
                black_box(item);
            });
        });
    }

    group.finish();
}

/// Benchmark inserting a body header in front of an existing payload.
fn bench_set_body_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_body_header");
    let factory = select_factory(FormatVersion::V12);

    for size in [64, 1024, 8192].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let template = generate_events(factory.as_ref(), 1, size).remove(0);
            b.iter(|| {
                let mut item = factory.make_ring_item(30, size).unwrap();
                item.append_body(template.body()).unwrap();
                item.set_body_header(black_box(BodyHeader::new(1, 2, 0))).unwrap();
                black_box(item);
            });
        });
    }

    group.finish();
}

/// Benchmark record equality and typed reinterpretation.
fn bench_compare_and_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");
    let factory = select_factory(FormatVersion::V11);
    let events = generate_events(factory.as_ref(), 2, 4096);
    let copy = factory.copy_ring_item(events[0].as_ref()).unwrap();

    group.bench_function("equal", |b| {
        b.iter(|| black_box(*events[0] == *copy));
    });
    group.bench_function("different", |b| {
        b.iter(|| black_box(*events[0] == *events[1]));
    });
    group.bench_function("make_typed", |b| {
        b.iter(|| {
            let typed = factory.make_typed(black_box(events[0].as_ref())).unwrap();
            black_box(typed);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_make_scaler,
    bench_make_state_change,
    bench_set_body_header,
    bench_compare_and_type,
);

criterion_main!(benches);
