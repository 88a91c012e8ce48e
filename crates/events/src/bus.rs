//! Event publishing/subscription abstraction (mechanics only).
//!
//! The store publishes every applied change; views subscribe and pull events
//! whenever they get a chance to re-render. Publishing happens after the
//! state change, so a subscriber that lags behind can always catch up by
//! reading the store's current snapshot.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every event published after it was
/// created (broadcast semantics), in publication order.
///
/// ```ignore
/// let changes = store.subscribe();
/// store.add(candidate);
/// for event in changes.drain() {
///     view.refresh(&event);
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Take every message that is already queued, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// ```text
/// intent → store (decide + apply) → bus (publish) → subscribers → re-render
/// ```
///
/// `publish()` can fail (e.g. internal lock poisoning). The state change has
/// already happened at that point, so callers log the failure and move on.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
