//! Blocking bounded queue on top of `CircularBuffer`.
//!
//! One mutex guards the ring; `not_full` and `not_empty` condition variables
//! park producers and consumers. Because producers wait while the ring is
//! full, the overwrite-on-full path is never taken here: every item pushed is
//! received exactly once.
//!
//! Usage:
//! `RUST_LOG=debug cargo run --example bounded_buffer -- [capacity] [items]`

use std::sync::{Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use circular_rs::CircularBuffer;

const DEFAULT_CAPACITY: usize = 1000;
const DEFAULT_ITEMS: u64 = 1_000_000;

struct BoundedBuffer<T> {
    ring: Mutex<CircularBuffer<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedBuffer<T> {
    fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a bounded buffer needs room for one item");
        Self {
            ring: Mutex::new(CircularBuffer::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Blocks until there is room, then inserts `item` at the front.
    fn push_front(&self, item: T) {
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ring = self
            .not_full
            .wait_while(ring, |ring| ring.is_full())
            .unwrap_or_else(PoisonError::into_inner);
        ring.push_front(item);
        drop(ring);
        self.not_empty.notify_one();
    }

    /// Blocks until an item is available, then removes the oldest one.
    fn pop_back(&self) -> T {
        let ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ring = self
            .not_empty
            .wait_while(ring, |ring| ring.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        let item = ring.pop_back();
        drop(ring);
        self.not_full.notify_one();
        // `wait_while` returned, so the ring held at least one item.
        item.unwrap_or_else(|| unreachable!("woken on an empty ring"))
    }
}

fn parse_arg<V: std::str::FromStr>(arg: Option<String>, default: V) -> V {
    arg.and_then(|raw| raw.parse().ok()).unwrap_or(default)
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let capacity = parse_arg(args.next(), DEFAULT_CAPACITY);
    let items = parse_arg(args.next(), DEFAULT_ITEMS);
    log::info!("bounded buffer: capacity={capacity} items={items}");

    let queue = BoundedBuffer::new(capacity);
    let started = Instant::now();

    let sum = thread::scope(|s| {
        s.spawn(|| {
            for i in 0..items {
                queue.push_front(i);
            }
            log::debug!("producer done");
        });
        let consumer = s.spawn(|| {
            let mut sum = 0u64;
            for expected in 0..items {
                let got = queue.pop_back();
                assert_eq!(got, expected, "items arrive in FIFO order");
                sum = sum.wrapping_add(got);
            }
            log::debug!("consumer done");
            sum
        });
        consumer.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    });

    let elapsed = started.elapsed();
    println!(
        "moved {items} items through a ring of {capacity} in {:.3}s (checksum {sum})",
        elapsed.as_secs_f64()
    );
}
