use thiserror::Error;

/// Failures reported by the waiting operations of a Cab instance.
///
/// `Interrupted` and `ConsumerTerminated` propagate immediately out of a
/// wait loop; the operation is not retried internally. The other two are
/// configuration and usage errors, not runtime conditions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CabError {
    /// The calling thread's cooperative interrupt flag was set while the
    /// operation was waiting. The operation did not complete.
    #[error("interrupted while waiting")]
    Interrupted,

    /// The consumer has permanently shut down via `consumer_interrupt`.
    /// Every current and future producer/sender call fails the same way.
    #[error("consumer was interrupted")]
    ConsumerTerminated,

    /// Rejected construction parameters.
    #[error("buffer size must not be less than 1")]
    InvalidConfiguration,

    /// `consumer_next` was invoked again after the consumer already signaled
    /// its own termination. A programmer error, not a recoverable condition.
    #[error("consumer was closed")]
    IllegalUsage,
}
