//! Process-local transport for outbox messages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryBusError {
    #[error("event bus lock poisoned")]
    Poisoned,

    /// The bus was closed; the message was not handed to any subscriber.
    #[error("event bus closed")]
    Closed,
}

/// Broadcast bus over `std::sync::mpsc` channels.
///
/// Each subscription receives a clone of every message published after it was
/// created. While the bus is closed every publish fails with
/// [`InMemoryBusError::Closed`], which is how an unreachable broker looks to
/// the outbox.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    closed: AtomicBool,
    outlets: Mutex<Vec<Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live subscriptions, as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.outlets().map(|outlets| outlets.len()).unwrap_or(0)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn outlets(&self) -> Result<MutexGuard<'_, Vec<Sender<M>>>, InMemoryBusError> {
        self.outlets.lock().map_err(|_| InMemoryBusError::Poisoned)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            closed: AtomicBool::new(false),
            outlets: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        if self.is_closed() {
            return Err(InMemoryBusError::Closed);
        }

        let mut outlets = self.outlets()?;
        let live = outlets.len();
        // A failed send means the subscription was dropped.
        outlets.retain(|outlet| outlet.send(message.clone()).is_ok());

        let gone = live - outlets.len();
        if gone > 0 {
            tracing::trace!(gone, remaining = outlets.len(), "dropped subscriptions removed");
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (outlet, receiver) = mpsc::channel();
        match self.outlets() {
            Ok(mut outlets) => outlets.push(outlet),
            Err(err) => tracing::warn!(error = %err, "subscription will never receive"),
        }
        Subscription::new(receiver)
    }
}
