use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release, SeqCst};
use std::sync::atomic::{AtomicBool, AtomicU32};
use std::thread;
use std::time::Duration;

use super::layout::{array_pad, CursorBlock};
use super::Buffer::{CabBuffer, CONSUMER_INTERRUPTED_SEQUENCE, INITIAL_SEQUENCE};
use crate::Core::error::CabError;
use crate::Core::wait::{WaitSet, WaitStrategy};

/// Upper bound on one park of the producer backpressure poll. The buffer
/// being full is the rare contended path, so it always uses this fixed
/// short-poll loop regardless of the configured wait strategy, giving the
/// consumer a good chance to drain.
const BACKPRESSURE_PARK: Duration = Duration::from_nanos(1);

// Occupancy token stored in the channel cell between the consumer capturing
// a message payload and committing it. Distinct from every heap pointer and
// from null, so senders stay excluded without the cell owning the payload
// twice. Never dereferenced.
static CAPTURED_TOKEN: u8 = 0;

impl<E, M> CabBuffer<E, M> {
    /// Allocates the slot store and cursors. `requested_size` is rounded up
    /// to the next power of two; `entry_factory` optionally pre-populates
    /// every ring slot for zero-allocation in-place reuse.
    pub(crate) fn new(
        requested_size: usize,
        strategy: WaitStrategy,
        mut entry_factory: Option<Box<dyn FnMut() -> E>>,
    ) -> Result<Self, CabError> {
        if requested_size < 1 {
            return Err(CabError::InvalidConfiguration);
        }
        let buffer_size = requested_size.next_power_of_two();

        let entry_pad = array_pad(std::mem::size_of::<UnsafeCell<Option<E>>>());
        let state_pad = array_pad(std::mem::size_of::<AtomicU32>());

        let entries: Box<[UnsafeCell<Option<E>>]> = (0..buffer_size + 2 * entry_pad)
            .map(|i| {
                let in_ring = i >= entry_pad && i < entry_pad + buffer_size;
                let value = match entry_factory.as_mut() {
                    Some(factory) if in_ring => Some(factory()),
                    _ => None,
                };
                UnsafeCell::new(value)
            })
            .collect();

        let entry_states: Box<[AtomicU32]> = (0..buffer_size + 2 * state_pad)
            .map(|_| AtomicU32::new(0))
            .collect();

        Ok(Self {
            cursors: CursorBlock::new(INITIAL_SEQUENCE),
            entries,
            entry_states,
            entry_pad,
            state_pad,
            buffer_size,
            index_mask: buffer_size as i64 - 1,
            strategy,
            wait_set: WaitSet::new(),
        })
    }

    /// Actual ring size, the next power of two of the requested size.
    pub(crate) fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    pub(crate) fn state(&self, sequence: i64) -> &AtomicU32 {
        &self.entry_states[self.state_pad + (sequence & self.index_mask) as usize]
    }

    #[inline]
    pub(crate) fn entry_slot(&self, sequence: i64) -> *mut Option<E> {
        self.entries[self.entry_pad + (sequence & self.index_mask) as usize].get()
    }

    #[inline]
    pub(crate) fn consumer_terminated(&self) -> bool {
        self.cursors.consumer_sequence.load(Acquire) == CONSUMER_INTERRUPTED_SEQUENCE
    }

    #[inline]
    pub(crate) fn captured_token() -> *mut M {
        &CAPTURED_TOKEN as *const u8 as *mut M
    }

    /// Claims the next sequence for a producer, waiting while the backlog
    /// past the consumer exceeds the ring capacity.
    pub(crate) fn producer_next(&self, interrupt: &AtomicBool) -> Result<i64, CabError> {
        let next_sequence = self.cursors.producer_sequence.fetch_add(1, AcqRel) + 1;

        loop {
            let consumer_sequence = self.cursors.consumer_sequence.load(Acquire);

            if consumer_sequence == CONSUMER_INTERRUPTED_SEQUENCE {
                return Err(CabError::ConsumerTerminated);
            }
            if next_sequence - consumer_sequence <= self.buffer_size as i64 {
                // there is some free space in the buffer
                return Ok(next_sequence);
            }

            thread::park_timeout(BACKPRESSURE_PARK);

            if interrupt.load(Acquire) {
                return Err(CabError::Interrupted);
            }
        }
    }

    /// Publishes slot `sequence` for the consumer to read.
    pub(crate) fn producer_commit(&self, sequence: i64) {
        self.state(sequence).store(1, Release);
        if self.strategy.uses_condvar() {
            self.wait_set.notify_all();
        }
    }

    /// Delivers one control message, waiting per the configured strategy
    /// until the channel cell is free.
    pub(crate) fn send(&self, message: M, interrupt: &AtomicBool) -> Result<(), CabError> {
        if self.consumer_terminated() {
            return Err(CabError::ConsumerTerminated);
        }

        let message_ptr = Box::into_raw(Box::new(message));

        let outcome = self.wait_set.wait_until(
            &self.strategy,
            || {
                self.cursors
                    .message
                    .compare_exchange(ptr::null_mut(), message_ptr, AcqRel, Acquire)
                    .is_ok()
                    .then_some(())
            },
            || {
                if self.consumer_terminated() {
                    return Err(CabError::ConsumerTerminated);
                }
                if interrupt.load(Acquire) {
                    return Err(CabError::Interrupted);
                }
                Ok(())
            },
        );

        match outcome {
            Ok(()) => {
                // The consumer may be parked waiting for an entry; a new
                // message must wake it.
                if self.strategy.uses_condvar() {
                    self.wait_set.notify_all();
                }
                Ok(())
            }
            Err(e) => {
                // The swap never succeeded, so the box is still ours.
                unsafe { drop(Box::from_raw(message_ptr)) };
                Err(e)
            }
        }
    }

    /// Consumer-only. Checks the channel cell. `None` means empty;
    /// `Some(Some(m))` is a newly captured payload; `Some(None)` means a
    /// message is still pending but its payload was already captured by an
    /// earlier call.
    pub(crate) fn poll_message(&self) -> Option<Option<M>> {
        let message_ptr = self.cursors.message.load(Acquire);
        if message_ptr.is_null() {
            return None;
        }
        if message_ptr == Self::captured_token() {
            return Some(None);
        }
        // Take ownership of the payload and leave the occupancy token in
        // the cell so senders stay excluded until consumer_commit clears it.
        // Only the consumer ever replaces a non-null cell value, so no other
        // write can race this pair.
        self.cursors
            .message
            .store(Self::captured_token(), Relaxed);
        Some(Some(unsafe { *Box::from_raw(message_ptr) }))
    }

    /// Consumer-only. Empties the channel cell and wakes blocked senders.
    pub(crate) fn clear_message(&self) {
        self.cursors.message.store(ptr::null_mut(), Release);
        if self.strategy.uses_condvar() {
            self.wait_set.notify_all();
        }
    }

    /// Consumer-only, terminal. Flags the consumer as permanently stopped
    /// and wakes every blocked producer and sender so they observe it.
    pub(crate) fn terminate_consumer(&self) {
        self.cursors
            .consumer_sequence
            .store(CONSUMER_INTERRUPTED_SEQUENCE, SeqCst);
        self.wait_set.notify_all();
    }
}

impl<E, M> Drop for CabBuffer<E, M> {
    fn drop(&mut self) {
        // Reclaim a message that was sent but never captured by the
        // consumer. A captured payload already moved into the consumer
        // handle and left only the token behind.
        let message_ptr = *self.cursors.message.get_mut();
        if !message_ptr.is_null() && message_ptr != Self::captured_token() {
            unsafe { drop(Box::from_raw(message_ptr)) };
        }
    }
}
