//! Synchronous observer registry for address book events.

use crate::peer_store::types::PeerAddress;

/// Events emitted by the address book.
#[derive(Debug, Clone)]
pub enum AddressBookEvent {
    /// Newly admitted (or unbanned) addresses, one batch per mutation.
    Added(Vec<PeerAddress>),
}

/// Handle returned by [`Notifier::register`], used to deregister.
pub type SubscriberId = usize;

/// Callback registry notified synchronously after a mutation completes.
///
/// Callbacks receive only the event, never the book, so a subscriber cannot
/// re-enter the book while it is being mutated.
pub struct Notifier<E> {
    subscribers: Vec<(SubscriberId, Box<dyn Fn(&E)>)>,
    next_id: SubscriberId,
}

impl<E> Notifier<E> {
    pub fn new() -> Self {
        Notifier {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn register<F: Fn(&E) + 'static>(&mut self, subscriber: F) -> SubscriberId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn deregister(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    pub fn notify(&self, event: &E) {
        for (_, subscriber) in &self.subscribers {
            subscriber(event);
        }
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Notifier::new()
    }
}
