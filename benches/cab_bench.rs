// Throughput benches for the entry path and the message path, driven
// against a draining nil consumer, one run per wait strategy.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use cab::CAB::{CabBuilder, CabConsumer, MESSAGE_RECEIVED_SEQUENCE};
use cab::Core::WaitStrategy;

const CAB_SIZE: usize = 10_000;
const BACKING_OFF_MAX_SPINS: u64 = 1_000;
const BACKING_OFF_MAX_YIELDS: u64 = 10_000;
const BATCH: usize = 1_000;

fn strategies() -> Vec<(&'static str, WaitStrategy)> {
    vec![
        ("busy_spinning", WaitStrategy::BusySpinning),
        ("yielding", WaitStrategy::Yielding),
        (
            "backing_off",
            WaitStrategy::BackingOff {
                max_spins: BACKING_OFF_MAX_SPINS,
                max_yields: BACKING_OFF_MAX_YIELDS,
            },
        ),
        ("blocking", WaitStrategy::Blocking),
    ]
}

/// Drains entries and messages without processing them, until its stop flag
/// interrupts the wait.
struct NilConsumer {
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl NilConsumer {
    fn start(mut consumer: CabConsumer<u64, u64>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let interrupt = Arc::clone(&stop);
        let handle = thread::spawn(move || loop {
            match consumer.consumer_next(&interrupt) {
                Ok(sequence) => {
                    if sequence == MESSAGE_RECEIVED_SEQUENCE {
                        consumer.get_message();
                    }
                    consumer.consumer_commit(sequence);
                }
                Err(_) => break,
            }
        });
        Self { stop, handle }
    }

    fn close(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.handle.join().unwrap();
    }
}

fn bench_entry_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("entry_producer");
    group.throughput(Throughput::Elements(BATCH as u64));

    for (name, strategy) in strategies() {
        let (cab, consumer) = CabBuilder::<u64, u64>::new(CAB_SIZE)
            .with_wait_strategy(strategy)
            .build()
            .unwrap();
        let nil = NilConsumer::start(consumer);
        let interrupt = AtomicBool::new(false);

        group.bench_function(name, |b| {
            b.iter(|| {
                for _ in 0..BATCH {
                    let sequence = cab.producer_next(&interrupt).unwrap();
                    unsafe { cab.set_entry(sequence, sequence as u64) };
                    cab.producer_commit(sequence);
                }
            })
        });

        drop(cab);
        nil.close();
    }

    group.finish();
}

fn bench_message_sender(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_sender");
    group.throughput(Throughput::Elements(BATCH as u64));

    for (name, strategy) in strategies() {
        let (cab, consumer) = CabBuilder::<u64, u64>::new(CAB_SIZE)
            .with_wait_strategy(strategy)
            .build()
            .unwrap();
        let nil = NilConsumer::start(consumer);
        let interrupt = AtomicBool::new(false);

        group.bench_function(name, |b| {
            b.iter(|| {
                for i in 0..BATCH {
                    cab.send(i as u64, &interrupt).unwrap();
                }
            })
        });

        drop(cab);
        nil.close();
    }

    group.finish();
}

criterion_group!(benches, bench_entry_producer, bench_message_sender);
criterion_main!(benches);
