use std::hint;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::Core::error::CabError;

/// How a thread waits on a Cab condition (an empty channel slot on the
/// sender side, a committed ring entry or incoming message on the consumer
/// side). Chosen once at construction, trading latency against CPU use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Tight re-check loop with a CPU spin-wait hint each iteration.
    BusySpinning,
    /// Re-check loop that yields the processor to the scheduler each
    /// iteration.
    Yielding,
    /// Escalates per wait: spin up to `max_spins` iterations, then yield up
    /// to `max_yields` further iterations, then wait on the condvar.
    BackingOff { max_spins: u64, max_yields: u64 },
    /// Always waits on the condvar under the mutex.
    Blocking,
}

impl WaitStrategy {
    /// Whether publishers must notify the wait set on commit/clear.
    pub(crate) fn uses_condvar(&self) -> bool {
        matches!(self, WaitStrategy::BackingOff { .. } | WaitStrategy::Blocking)
    }
}

// Escalation states of the backing-off wait.
enum BackingOffState {
    Initial,
    Spinning,
    Yielding,
}

/// Upper bound on one condvar park. A blocked thread re-checks its condition
/// and cancellation flags at least this often even when no publish happens,
/// so a cooperative interrupt set without any accompanying notification is
/// still observed.
const BLOCKED_RECHECK_INTERVAL: Duration = Duration::from_millis(1);

/// One mutex/condvar pair shared by all waiters of a Cab instance.
///
/// Publishers lock the mutex before notifying; waiters re-check their
/// condition under the same lock before parking. This closes the window
/// where a publish could slip between a failed check and the park.
pub(crate) struct WaitSet {
    lock: Mutex<()>,
    available: Condvar,
}

impl WaitSet {
    pub(crate) fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            available: Condvar::new(),
        }
    }

    pub(crate) fn notify_all(&self) {
        let _guard = self.lock.lock();
        self.available.notify_all();
    }

    /// Runs `attempt` until it yields a value, waiting per `strategy`
    /// between failures. `cancelled` is consulted after every failed
    /// attempt, on every spin and yield iteration and on every wake from a
    /// blocked wait; its error aborts the wait immediately.
    ///
    /// Since notify-all can wake several waiters for one event, a wake never
    /// implies the condition holds; `attempt` decides every time.
    pub(crate) fn wait_until<T>(
        &self,
        strategy: &WaitStrategy,
        mut attempt: impl FnMut() -> Option<T>,
        mut cancelled: impl FnMut() -> Result<(), CabError>,
    ) -> Result<T, CabError> {
        match *strategy {
            WaitStrategy::BusySpinning => loop {
                if let Some(value) = attempt() {
                    return Ok(value);
                }
                cancelled()?;
                hint::spin_loop();
            },

            WaitStrategy::Yielding => loop {
                if let Some(value) = attempt() {
                    return Ok(value);
                }
                cancelled()?;
                thread::yield_now();
            },

            WaitStrategy::BackingOff {
                max_spins,
                max_yields,
            } => {
                let mut state = BackingOffState::Initial;
                let mut spins = 0u64;
                let mut yields = 0u64;

                loop {
                    if let Some(value) = attempt() {
                        return Ok(value);
                    }
                    cancelled()?;

                    match state {
                        BackingOffState::Initial => {
                            state = BackingOffState::Spinning;
                            spins += 1;
                        }
                        BackingOffState::Spinning => {
                            spins += 1;
                            if spins > max_spins {
                                state = BackingOffState::Yielding;
                            } else {
                                hint::spin_loop();
                            }
                        }
                        BackingOffState::Yielding => {
                            yields += 1;
                            if yields > max_yields {
                                // Terminal escalation: park on the condvar
                                // until the attempt succeeds or the wait is
                                // cancelled.
                                return self.block_on(attempt, cancelled);
                            }
                            thread::yield_now();
                        }
                    }
                }
            }

            WaitStrategy::Blocking => self.block_on(attempt, cancelled),
        }
    }

    fn block_on<T>(
        &self,
        mut attempt: impl FnMut() -> Option<T>,
        mut cancelled: impl FnMut() -> Result<(), CabError>,
    ) -> Result<T, CabError> {
        let mut guard = self.lock.lock();
        loop {
            if let Some(value) = attempt() {
                return Ok(value);
            }
            cancelled()?;
            let _ = self
                .available
                .wait_for(&mut guard, BLOCKED_RECHECK_INTERVAL);
        }
    }
}
