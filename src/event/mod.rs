mod bus;
mod events;

pub use bus::{EventBus, SubscriptionId};
pub use events::*;

/// Receives events from an [`EventBus`] it has been subscribed to.
///
/// Handlers run synchronously inside [`EventBus::emit`]. The bus is not
/// locked while they run, so a handler may subscribe or unsubscribe (itself
/// included). An event emitted from inside a handler is not delivered back to
/// that same handler.
pub trait EventHandler<E>: Send {
    fn handle_event(&mut self, event: &E);
}

impl<E, F> EventHandler<E> for F
where
    F: FnMut(&E) + Send,
{
    fn handle_event(&mut self, event: &E) {
        self(event)
    }
}
