use std::marker::PhantomData;
use std::sync::Arc;

use super::consumer::CabConsumer;
use super::producer::Cab;
use super::Buffer::CabBuffer;
use crate::Core::error::CabError;
use crate::Core::wait::WaitStrategy;

/// Builds a Cab instance: the shared producer/sender handle plus the unique
/// consumer handle.
///
/// The requested size is rounded up to the next power of two. The default
/// wait strategy is [`WaitStrategy::Blocking`]; pick a spinning flavor for
/// latency-critical deployments.
pub struct CabBuilder<E, M> {
    buffer_size: usize,
    strategy: WaitStrategy,
    entry_factory: Option<Box<dyn FnMut() -> E>>,
    _message: PhantomData<M>,
}

impl<E, M> CabBuilder<E, M> {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            strategy: WaitStrategy::Blocking,
            entry_factory: None,
            _message: PhantomData,
        }
    }

    pub fn with_wait_strategy(mut self, strategy: WaitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Pre-populates every ring slot at construction, enabling
    /// zero-allocation steady-state reuse of mutable payload objects via
    /// `get_entry`.
    pub fn with_entry_factory(mut self, factory: impl FnMut() -> E + 'static) -> Self {
        self.entry_factory = Some(Box::new(factory));
        self
    }

    /// Allocates the instance. Fails with
    /// [`CabError::InvalidConfiguration`] if the requested size is less
    /// than 1.
    pub fn build(self) -> Result<(Cab<E, M>, CabConsumer<E, M>), CabError> {
        let shared = Arc::new(CabBuffer::new(
            self.buffer_size,
            self.strategy,
            self.entry_factory,
        )?);

        Ok((
            Cab {
                shared: Arc::clone(&shared),
            },
            CabConsumer::new(shared),
        ))
    }
}
