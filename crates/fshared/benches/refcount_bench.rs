//! fshared Reference Counting Benchmarks
//!
//! Measures the cost of the count protocol on its hot paths.
//! Run with: `cargo bench --package fshared`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fshared::{SharedPtr, WeakPtr};
use std::sync::{Arc, Barrier};
use std::thread;

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    group.bench_function("new_u64", |b| b.iter(|| black_box(SharedPtr::new(black_box(7u64)))));

    group.bench_function("from_raw_with_deleter", |b| {
        fn deleter(ptr: *mut u64) {
            drop(unsafe { Box::from_raw(ptr) });
        }
        b.iter(|| {
            let raw = Box::into_raw(Box::new(7u64));
            black_box(unsafe { SharedPtr::from_raw_with_deleter(raw, deleter) })
        })
    });

    group.bench_function("std_arc_baseline", |b| b.iter(|| black_box(Arc::new(black_box(7u64)))));

    group.finish();
}

fn bench_clone_drop(c: &mut Criterion) {
    let mut group = c.benchmark_group("clone_drop");
    group.throughput(Throughput::Elements(1));

    let owner = SharedPtr::new(String::from("bench"));
    group.bench_function("shared_ptr", |b| b.iter(|| drop(black_box(owner.clone()))));

    let observer = owner.downgrade();
    group.bench_function("weak_ptr", |b| b.iter(|| drop(black_box(observer.clone()))));

    let arc = Arc::new(String::from("bench"));
    group.bench_function("std_arc_baseline", |b| b.iter(|| drop(black_box(Arc::clone(&arc)))));

    group.finish();
}

fn bench_upgrade(c: &mut Criterion) {
    let mut group = c.benchmark_group("upgrade");

    let owner = SharedPtr::new(1u64);
    let observer = owner.downgrade();
    group.bench_function("lock_alive", |b| b.iter(|| black_box(observer.lock())));

    let expired: WeakPtr<u64> = SharedPtr::new(1u64).downgrade();
    group.bench_function("lock_expired", |b| b.iter(|| black_box(expired.lock())));

    group.bench_function("downgrade", |b| b.iter(|| black_box(owner.downgrade())));

    group.finish();
}

fn bench_contended_clone(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_clone");
    group.sample_size(20);

    for &threads in &[2usize, 4, 8] {
        let cycles = 10_000;
        group.throughput(Throughput::Elements((threads * cycles) as u64));
        group.bench_function(format!("threads_{}", threads), |b| {
            b.iter(|| {
                let owner = SharedPtr::new(0u64);
                let barrier = Arc::new(Barrier::new(threads));
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let local = owner.clone();
                        let barrier = Arc::clone(&barrier);
                        thread::spawn(move || {
                            barrier.wait();
                            for _ in 0..cycles {
                                drop(black_box(local.clone()));
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().expect("Thread should not panic");
                }
                black_box(owner.use_count())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_construction,
    bench_clone_drop,
    bench_upgrade,
    bench_contended_clone,
);

criterion_main!(benches);
