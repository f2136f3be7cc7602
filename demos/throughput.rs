// Pumps precomputed sha256 payloads through the ring with a draining
// consumer and reports end-to-end throughput. A checkpoint message goes
// through the channel every MESSAGING_FACTOR entries.
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use sha2::{Digest, Sha256};

use cab::CAB::{CabBuilder, MESSAGE_RECEIVED_SEQUENCE};
use cab::Core::WaitStrategy;

const CAB_SIZE: usize = 1024;
const MESSAGING_FACTOR: usize = 1_000;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_entries>", args[0]);
        std::process::exit(1);
    }
    let num_entries: usize = args[1].parse().expect("Invalid number of entries");
    let num_messages = num_entries.div_ceil(MESSAGING_FACTOR);

    println!("Precomputing {num_entries} hashes...");
    let start_precompute = std::time::Instant::now();
    let mut hashes = Vec::with_capacity(num_entries);
    for i in 0..num_entries {
        let mut hasher = Sha256::new();
        hasher.update(format!("entry_{i}").as_bytes());
        hashes.push(format!("{:x}", hasher.finalize()));
    }
    println!(
        "Precomputed {} hashes in {:.2?}",
        num_entries,
        start_precompute.elapsed()
    );

    let (cab, mut consumer) = CabBuilder::<String, String>::new(CAB_SIZE)
        .with_wait_strategy(WaitStrategy::BackingOff {
            max_spins: 1_000,
            max_yields: 10_000,
        })
        .build()
        .expect("cab size is valid");

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let interrupt = Arc::clone(&interrupt);
        ctrlc::set_handler(move || {
            interrupt.store(true, Ordering::SeqCst);
        })
        .expect("Error setting Ctrl+C handler");
    }

    let drained = {
        let interrupt = Arc::clone(&interrupt);
        thread::spawn(move || {
            let mut entries = 0usize;
            let mut messages = 0usize;
            while entries < num_entries || messages < num_messages {
                let sequence = match consumer.consumer_next(&interrupt) {
                    Ok(sequence) => sequence,
                    Err(e) => {
                        eprintln!("consumer stopped: {e}");
                        break;
                    }
                };
                if sequence == MESSAGE_RECEIVED_SEQUENCE {
                    consumer.get_message();
                    messages += 1;
                } else {
                    unsafe { consumer.remove_entry(sequence) };
                    entries += 1;
                }
                consumer.consumer_commit(sequence);
            }
            (entries, messages)
        })
    };

    println!("Pumping {num_entries} entries through the ring...");
    let start_send = std::time::Instant::now();
    let mut sent = 0usize;

    for (i, hash) in hashes.into_iter().enumerate() {
        if i % MESSAGING_FACTOR == 0 {
            if let Err(e) = cab.send(format!("checkpoint:{i}"), &interrupt) {
                eprintln!("send failed at {i}: {e}");
                break;
            }
        }
        match cab.producer_next(&interrupt) {
            Ok(sequence) => {
                unsafe { cab.set_entry(sequence, hash) };
                cab.producer_commit(sequence);
                sent += 1;
            }
            Err(e) => {
                eprintln!("produce failed at {i}: {e}");
                break;
            }
        }
    }

    let (entries, messages) = drained.join().unwrap();
    let elapsed = start_send.elapsed();

    println!("Sent {sent} entries in {elapsed:.2?}");
    println!("Consumer drained {entries} entries and {messages} messages");
    println!(
        "Throughput: {:.2} million entries/sec",
        (sent as f64 / elapsed.as_secs_f64()) / 1_000_000.0
    );
}
