// Interactive console demo. Line-oriented commands are forwarded to
// per-index workers; each worker queues at most one pending item under its
// own mutex/condvar and drives the shared Cab from its own thread, while a
// consumer thread prints everything it drains.
//
// Commands:
//   p <worker> <number>   produce a ring entry through worker <worker>
//   s <worker> <text>     send a control message through worker <worker>
//   help                  show this summary
//   quit                  shut down
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};

use cab::CAB::{Cab, CabBuilder, CabConsumer, MESSAGE_RECEIVED_SEQUENCE};
use cab::Core::WaitStrategy;

const WORKERS: usize = 4;
const CAB_SIZE: usize = 64;

enum Job {
    Produce(i64),
    Send(String),
}

/// One pending item per worker, handed over under the worker's own lock.
struct Mailbox {
    slot: Mutex<Option<Job>>,
    ready: Condvar,
    shutdown: AtomicBool,
}

impl Mailbox {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Queues a job, waiting while the previous one is still pending.
    fn post(&self, job: Job) {
        let mut slot = self.slot.lock();
        while slot.is_some() {
            if self.shutdown.load(Ordering::Acquire) {
                return;
            }
            self.ready.wait(&mut slot);
        }
        *slot = Some(job);
        self.ready.notify_all();
    }

    fn close(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _slot = self.slot.lock();
        self.ready.notify_all();
    }
}

fn run_worker(id: usize, mailbox: Arc<Mailbox>, cab: Cab<i64, String>, interrupt: Arc<AtomicBool>) {
    loop {
        let job = {
            let mut slot = mailbox.slot.lock();
            loop {
                if mailbox.shutdown.load(Ordering::Acquire) {
                    return;
                }
                if let Some(job) = slot.take() {
                    // wake a poster waiting for the slot to free up
                    mailbox.ready.notify_all();
                    break job;
                }
                mailbox.ready.wait(&mut slot);
            }
        };

        let result = match job {
            Job::Produce(value) => cab.producer_next(&interrupt).map(|sequence| {
                unsafe { cab.set_entry(sequence, value) };
                cab.producer_commit(sequence);
            }),
            Job::Send(text) => cab.send(format!("worker#{id}: {text}"), &interrupt),
        };

        if let Err(e) = result {
            eprintln!("worker#{id}: {e}");
            return;
        }
    }
}

fn run_consumer(mut consumer: CabConsumer<i64, String>, interrupt: Arc<AtomicBool>) {
    loop {
        match consumer.consumer_next(&interrupt) {
            Ok(sequence) => {
                if sequence == MESSAGE_RECEIVED_SEQUENCE {
                    if let Some(message) = consumer.get_message() {
                        println!("[message] {message}");
                    }
                } else {
                    let value = unsafe { consumer.remove_entry(sequence) };
                    println!("[entry #{sequence}] {}", value.unwrap_or_default());
                }
                consumer.consumer_commit(sequence);
            }
            Err(_) => {
                consumer.consumer_interrupt();
                return;
            }
        }
    }
}

fn print_help() {
    println!("p <worker> <number>   produce a ring entry (worker 0..{})", WORKERS - 1);
    println!("s <worker> <text>     send a control message");
    println!("help                  this summary");
    println!("quit                  shut down");
}

fn main() {
    let (cab, consumer) = CabBuilder::<i64, String>::new(CAB_SIZE)
        .with_wait_strategy(WaitStrategy::Blocking)
        .build()
        .expect("cab size is valid");

    let interrupt = Arc::new(AtomicBool::new(false));
    let mailboxes: Vec<Arc<Mailbox>> = (0..WORKERS).map(|_| Arc::new(Mailbox::new())).collect();

    let consumer_handle = {
        let interrupt = Arc::clone(&interrupt);
        thread::spawn(move || run_consumer(consumer, interrupt))
    };

    let worker_handles: Vec<_> = mailboxes
        .iter()
        .enumerate()
        .map(|(id, mailbox)| {
            let mailbox = Arc::clone(mailbox);
            let cab = cab.clone();
            let interrupt = Arc::clone(&interrupt);
            thread::spawn(move || run_worker(id, mailbox, cab, interrupt))
        })
        .collect();

    {
        let interrupt = Arc::clone(&interrupt);
        let mailboxes = mailboxes.clone();
        ctrlc::set_handler(move || {
            interrupt.store(true, Ordering::SeqCst);
            for mailbox in &mailboxes {
                mailbox.close();
            }
        })
        .expect("Error setting Ctrl+C handler");
    }

    print_help();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if interrupt.load(Ordering::Acquire) {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("p") => {
                let index = parts.next().and_then(|s| s.parse::<usize>().ok());
                let value = parts.next().and_then(|s| s.parse::<i64>().ok());
                match (index, value) {
                    (Some(index), Some(value)) if index < WORKERS => {
                        mailboxes[index].post(Job::Produce(value));
                    }
                    _ => println!("usage: p <worker 0..{}> <number>", WORKERS - 1),
                }
            }
            Some("s") => {
                let index = parts.next().and_then(|s| s.parse::<usize>().ok());
                let text = parts.collect::<Vec<_>>().join(" ");
                match index {
                    Some(index) if index < WORKERS && !text.is_empty() => {
                        mailboxes[index].post(Job::Send(text));
                    }
                    _ => println!("usage: s <worker 0..{}> <text>", WORKERS - 1),
                }
            }
            Some("help") => print_help(),
            Some("quit") => break,
            Some(other) => println!("unknown command: {other}"),
            None => {}
        }
    }

    interrupt.store(true, Ordering::SeqCst);
    for mailbox in &mailboxes {
        mailbox.close();
    }
    for handle in worker_handles {
        let _ = handle.join();
    }
    let _ = consumer_handle.join();

    println!("bye");
}
