use tokio::sync::mpsc;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Typed publish/subscribe fan-out for one connection.
///
/// Publishing is synchronous: every live subscriber has the event queued
/// before `publish` returns. Subscribers whose receiver was dropped are
/// forgotten on the next publish.
#[derive(Debug)]
pub struct EventBus<E> {
    next_id: u64,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<E>)>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> (SubscriberId, mpsc::UnboundedReceiver<E>) {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.push((id, sender));
        (id, receiver)
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
        self.subscribers.len() != before
    }

    /// Deliver `event` to every subscriber, in subscription order. Returns the
    /// number of subscribers reached.
    pub fn publish(&mut self, event: E) -> usize {
        self.subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
        self.subscribers.len()
    }

    /// Drop every subscriber; their receivers see the end of the stream.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
