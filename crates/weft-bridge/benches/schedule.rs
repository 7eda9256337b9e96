//! Submission-path benchmarks for the bridge

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;
use weft_bridge::{to_scheduler, ExecutorRef, Scheduler, Worker};
use weft_core::SpawnExecutor;

fn bench_schedule(c: &mut Criterion) {
    let executor = SpawnExecutor::new().expect("Failed to create executor");
    let scheduler = to_scheduler(ExecutorRef::Native(executor));
    let worker = scheduler.create_worker();

    c.bench_function("worker_schedule_zero_delay", |b| {
        b.iter(|| black_box(worker.schedule(Box::new(|| {}), Duration::ZERO)))
    });

    c.bench_function("schedule_direct_delayed", |b| {
        b.iter(|| {
            let handle = scheduler.schedule_direct(Box::new(|| {}), Duration::from_secs(60));
            handle.dispose();
            black_box(handle)
        })
    });

    scheduler.shutdown();
}

criterion_group!(benches, bench_schedule);
criterion_main!(benches);
