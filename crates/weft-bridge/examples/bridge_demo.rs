//! Runs a few tasks through the executor-to-scheduler direction and prints
//! the observed order: the delayed task is submitted first but never holds
//! back the zero-delay ones.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use weft_bridge::{to_scheduler, ExecutorRef, Scheduler, Worker};
use weft_core::SpawnExecutor;

fn main() {
    let executor = SpawnExecutor::new().expect("Failed to create executor");
    let scheduler = to_scheduler(ExecutorRef::Native(executor));
    let worker = scheduler.create_worker();

    let log = Arc::new(Mutex::new(Vec::new()));

    let sink = log.clone();
    worker.schedule(
        Box::new(move || sink.lock().push("delayed (200ms)".to_string())),
        Duration::from_millis(200),
    );
    for i in 1..=3 {
        let sink = log.clone();
        worker.schedule(
            Box::new(move || sink.lock().push(format!("task {i}"))),
            Duration::ZERO,
        );
    }

    thread::sleep(Duration::from_millis(400));
    for line in log.lock().iter() {
        println!("{line}");
    }

    scheduler.shutdown();
}
