use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicI64, AtomicPtr};

/// Assumed line size for padding calculations. `CachePadded` may round up
/// further on platforms whose prefetchers pull line pairs.
pub const CACHE_LINE_SIZE: usize = 64;

/// Number of pad elements placed on each side of a hot array so that its
/// first and last live elements share no cache line with neighboring data.
/// Covers two lines per side, matching the prefetcher-safe stride used for
/// the cursor block.
pub const fn array_pad(element_size: usize) -> usize {
    if element_size == 0 {
        0
    } else {
        (2 * CACHE_LINE_SIZE + element_size - 1) / element_size
    }
}

/// The hot shared fields of a Cab instance, each isolated on its own cache
/// line so unrelated concurrent writers never invalidate each other.
///
/// The message cell holds a raw channel pointer: null when empty, a sender's
/// boxed message while one is in flight, or a dangling occupancy token after
/// the consumer has captured the payload but not yet committed it.
#[repr(C)]
pub struct CursorBlock<M> {
    /// Position of the consumer. Written only by the consumer thread with
    /// release ordering; doubles as the terminal shutdown flag when set to
    /// `CONSUMER_INTERRUPTED_SEQUENCE`.
    pub consumer_sequence: CachePadded<AtomicI64>,

    /// Highest sequence ever claimed by a producer (not necessarily
    /// committed). Atomically incremented to claim a slot for writing.
    pub producer_sequence: CachePadded<AtomicI64>,

    /// Single-slot channel cell for control messages.
    pub message: CachePadded<AtomicPtr<M>>,
}

impl<M> CursorBlock<M> {
    pub(crate) fn new(initial_sequence: i64) -> Self {
        Self {
            consumer_sequence: CachePadded::new(AtomicI64::new(initial_sequence)),
            producer_sequence: CachePadded::new(AtomicI64::new(initial_sequence)),
            message: CachePadded::new(AtomicPtr::new(std::ptr::null_mut())),
        }
    }
}
