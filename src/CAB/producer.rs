use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::Buffer::CabBuffer;
use crate::Core::error::CabError;

/// Cloneable producer/sender handle of a Cab instance.
///
/// Every producer thread and every message-sender thread owns a clone. The
/// pattern of usage on the producer side:
///
/// claim a sequence with `producer_next`, fill the slot through
/// `set_entry`/`get_entry` at that sequence, then publish it with
/// `producer_commit`. Senders just call `send`; the message is delivered
/// once the channel slot is free.
///
/// Waiting calls take a cooperative interrupt flag; setting it makes the
/// call fail with [`CabError::Interrupted`] instead of completing.
pub struct Cab<E, M> {
    pub(crate) shared: Arc<CabBuffer<E, M>>,
}

impl<E, M> Clone for Cab<E, M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E, M> Cab<E, M> {
    /// Actual ring size, the next power of two of the requested size.
    pub fn buffer_size(&self) -> usize {
        self.shared.buffer_size()
    }

    /// Claims a sequence addressing the next available entry slot. The call
    /// waits while the ring is full.
    ///
    /// The caller must fill the slot at the returned sequence and then
    /// publish it with [`producer_commit`](Self::producer_commit).
    pub fn producer_next(&self, interrupt: &AtomicBool) -> Result<i64, CabError> {
        self.shared.producer_next(interrupt)
    }

    /// Publishes the claimed sequence, making the entry visible to the
    /// consumer. Commits from different producers are independent per slot;
    /// the consumer still reads sequences strictly in order.
    pub fn producer_commit(&self, sequence: i64) {
        self.shared.producer_commit(sequence)
    }

    /// Sends one control message to the channel, waiting per the configured
    /// strategy while another message is in flight. At most one message is
    /// ever pending; concurrent calls resolve to exactly one immediate
    /// winner.
    ///
    /// On failure the message is dropped along with the returned error.
    pub fn send(&self, message: M, interrupt: &AtomicBool) -> Result<(), CabError> {
        self.shared.send(message, interrupt)
    }

    /// Reads the entry at `sequence` for in-place modification.
    ///
    /// # Safety
    /// The caller must legitimately own `sequence`, i.e. hold it from an
    /// uncommitted `producer_next` claim (or, on the consumer side, from
    /// `consumer_next`). No bounds or state validation is performed.
    pub unsafe fn get_entry(&self, sequence: i64) -> Option<&mut E> {
        unsafe { (*self.shared.entry_slot(sequence)).as_mut() }
    }

    /// Stores `entry` at `sequence`, replacing any previous payload.
    ///
    /// # Safety
    /// Same ownership contract as [`get_entry`](Self::get_entry).
    pub unsafe fn set_entry(&self, sequence: i64, entry: E) {
        unsafe { *self.shared.entry_slot(sequence) = Some(entry) };
    }

    /// Clears the slot at `sequence` and returns its payload. The slot's
    /// state flag is unaffected.
    ///
    /// # Safety
    /// Same ownership contract as [`get_entry`](Self::get_entry).
    pub unsafe fn remove_entry(&self, sequence: i64) -> Option<E> {
        unsafe { (*self.shared.entry_slot(sequence)).take() }
    }
}
