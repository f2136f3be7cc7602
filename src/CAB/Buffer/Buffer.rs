// Shared core of a Cab instance - the ring of entry slots plus the
// single-slot control channel.

use std::cell::UnsafeCell;
use std::sync::atomic::AtomicU32;

use super::layout::CursorBlock;
use crate::Core::wait::{WaitSet, WaitStrategy};

/// Reserved sequence returned by the consumer's next-operation when a
/// control message is ready to be read instead of a ring entry.
pub const MESSAGE_RECEIVED_SEQUENCE: i64 = i64::MAX;

/// Terminal value of the consumer cursor meaning the consumer has
/// permanently stopped. Once stored it never reverts.
pub const CONSUMER_INTERRUPTED_SEQUENCE: i64 = i64::MIN;

pub(crate) const INITIAL_SEQUENCE: i64 = -1;

/// The shared state behind the producer/sender and consumer handles.
///
/// ### Concurrency design
/// - **Producers**: claim a slot by atomically incrementing the producer
///   cursor; ownership of `sequence & index_mask` is established purely by
///   winning that increment. A claim waits while more than `buffer_size`
///   sequences are outstanding past the consumer (backpressure).
/// - **Senders**: install a message by compare-and-swapping the channel cell
///   from null; exactly one swap succeeds while the cell is empty.
/// - **Consumer**: reads sequences strictly in order, gated by the per-slot
///   state flags; a slot's flag is 1 only between the producer's commit and
///   the consumer's commit of that same sequence.
///
/// No lock protects the slot or state arrays themselves; correctness relies
/// entirely on the claim/commit and state-flag protocol.
pub struct CabBuffer<E, M> {
    pub(crate) cursors: CursorBlock<M>,

    /// Ring payload slots, padded at both ends so index 0 shares no cache
    /// line with adjacent data. A slot is mutated only by whichever thread
    /// currently owns its sequence.
    pub(crate) entries: Box<[UnsafeCell<Option<E>>]>,

    /// Per-slot availability flags (0 = empty/writable, 1 = committed),
    /// padded like `entries`.
    pub(crate) entry_states: Box<[AtomicU32]>,

    pub(crate) entry_pad: usize,
    pub(crate) state_pad: usize,

    /// Normalized capacity (next power of two of the requested size).
    pub(crate) buffer_size: usize,
    pub(crate) index_mask: i64,

    pub(crate) strategy: WaitStrategy,
    pub(crate) wait_set: WaitSet,
}

// The claim/commit protocol hands each slot to exactly one owner at a time,
// so moving E and M across threads is all that is required of them.
unsafe impl<E: Send, M: Send> Send for CabBuffer<E, M> {}
unsafe impl<E: Send, M: Send> Sync for CabBuffer<E, M> {}
