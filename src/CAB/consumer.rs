use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::Arc;

use super::Buffer::{CabBuffer, CONSUMER_INTERRUPTED_SEQUENCE, MESSAGE_RECEIVED_SEQUENCE};
use crate::Core::error::CabError;

/// The unique consumer handle of a Cab instance.
///
/// All operations take `&mut self`, so the single-consumer requirement is
/// enforced by ownership: the handle cannot be cloned and its methods cannot
/// overlap. The usual loop:
///
/// take a sequence with `consumer_next`; if it equals
/// [`MESSAGE_RECEIVED_SEQUENCE`] read the message with `get_message`,
/// otherwise read the ring entry at that sequence; then `consumer_commit`
/// the sequence to free the slot (or the channel cell) for the other side.
pub struct CabConsumer<E, M> {
    pub(crate) shared: Arc<CabBuffer<E, M>>,
    /// Last captured control message. Consumer-private, no synchronization.
    message_cache: Option<M>,
}

impl<E, M> CabConsumer<E, M> {
    pub(crate) fn new(shared: Arc<CabBuffer<E, M>>) -> Self {
        Self {
            shared,
            message_cache: None,
        }
    }

    /// Actual ring size, the next power of two of the requested size.
    pub fn buffer_size(&self) -> usize {
        self.shared.buffer_size()
    }

    /// Returns the next sequence to be read, waiting per the configured
    /// strategy until something arrives.
    ///
    /// A pending control message always wins: whenever the channel cell is
    /// occupied it is captured and [`MESSAGE_RECEIVED_SEQUENCE`] returned
    /// before any ring entry is considered, and the cell is re-checked on
    /// every wait iteration. Otherwise the call waits for the slot after
    /// the current consumer position and returns that sequence.
    ///
    /// Fails with [`CabError::Interrupted`] if `interrupt` is set while
    /// waiting, and with [`CabError::IllegalUsage`] once this consumer has
    /// already issued [`consumer_interrupt`](Self::consumer_interrupt).
    pub fn consumer_next(&mut self, interrupt: &AtomicBool) -> Result<i64, CabError> {
        let shared = &self.shared;

        // Sole writer of the consumer cursor, so a plain load is enough.
        let consumer_sequence = shared.cursors.consumer_sequence.load(Relaxed);
        if consumer_sequence == CONSUMER_INTERRUPTED_SEQUENCE {
            return Err(CabError::IllegalUsage);
        }

        // check the message first
        if let Some(payload) = shared.poll_message() {
            if let Some(message) = payload {
                self.message_cache = Some(message);
            }
            return Ok(MESSAGE_RECEIVED_SEQUENCE);
        }

        // continue with the buffer, re-checking the message while waiting
        let next_sequence = consumer_sequence + 1;
        let state = shared.state(next_sequence);

        let mut captured: Option<M> = None;
        let sequence = shared.wait_set.wait_until(
            &shared.strategy,
            || {
                if let Some(payload) = shared.poll_message() {
                    captured = payload;
                    return Some(MESSAGE_RECEIVED_SEQUENCE);
                }
                (state.load(Acquire) != 0).then_some(next_sequence)
            },
            || {
                if interrupt.load(Acquire) {
                    Err(CabError::Interrupted)
                } else {
                    Ok(())
                }
            },
        )?;

        if let Some(message) = captured {
            self.message_cache = Some(message);
        }
        Ok(sequence)
    }

    /// Commits `sequence`, signaling readiness for the next message or
    /// entry. For [`MESSAGE_RECEIVED_SEQUENCE`] this clears the channel
    /// cell and wakes blocked senders; otherwise it resets the slot's state
    /// flag and publishes the new consumer position, which is what unblocks
    /// producers waiting on backpressure.
    pub fn consumer_commit(&mut self, sequence: i64) {
        if sequence == MESSAGE_RECEIVED_SEQUENCE {
            self.shared.clear_message();
            return;
        }

        self.shared.state(sequence).store(0, Release);
        self.shared
            .cursors
            .consumer_sequence
            .store(sequence, Release);
    }

    /// Permanently shuts this consumer down. Every current and future
    /// `producer_next`/`send` call on the instance fails with
    /// [`CabError::ConsumerTerminated`] after this; the flag never reverts.
    pub fn consumer_interrupt(&mut self) {
        self.shared.terminate_consumer();
    }

    /// Takes the message captured by the last message-ready
    /// [`consumer_next`](Self::consumer_next).
    pub fn get_message(&mut self) -> Option<M> {
        self.message_cache.take()
    }

    /// Reads the entry at `sequence` for in-place access.
    ///
    /// # Safety
    /// The caller must legitimately own `sequence`, i.e. hold it from an
    /// uncommitted `consumer_next` (or a producer claim). No bounds or
    /// state validation is performed.
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
