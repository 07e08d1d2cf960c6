use log::warn;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::event::EventHandler;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`EventBus::subscribe`]. Whoever holds it owns the
/// obligation to call [`EventBus::unsubscribe`] on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SharedHandler<E> = Arc<Mutex<Box<dyn EventHandler<E>>>>;
type Handlers<E> = Vec<(SubscriptionId, SharedHandler<E>)>;

/// A simple event bus for broadcasting events to registered handlers.
///
/// Clones share the same handler list, so a subscriber can keep a clone of the
/// bus around to unsubscribe later.
pub struct EventBus<E> {
    handlers: Arc<Mutex<Handlers<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.lock().len()))
            .finish()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: Box<dyn EventHandler<E>>) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::SeqCst));
        self.handlers.lock().push((id, Arc::new(Mutex::new(handler))));
        id
    }

    /// Remove a handler. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Emit an event to all registered handlers, in subscription order.
    ///
    /// Handlers are called with the handler list unlocked. One unsubscribed
    /// by an earlier handler during the same emit is skipped.
    pub fn emit(&self, event: E) {
        let snapshot: Handlers<E> = self
            .handlers
            .lock()
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        for (id, handler) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            match handler.try_lock() {
                Some(mut handler) => handler.handle_event(&event),
                None => warn!("Handler {:?} is already running, event not delivered to it", id),
            }
        }
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.handlers.lock().iter().any(|(handler_id, _)| *handler_id == id)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}
