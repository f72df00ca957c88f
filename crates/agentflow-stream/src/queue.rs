use crate::ExecutionEvent;
use tokio::sync::mpsc;
use tracing::warn;

/// Default bounded-queue capacity per `spec.md` §4.4 ("bounded queue
/// (default capacity 1000, per run)").
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Producer half of the per-run event queue. Cloned into every [`crate::Emitter`]
/// and held by the engine itself, so there can be many producers and
/// exactly one consumer ([`EventReceiver`]).
pub type EventSender = mpsc::Sender<ExecutionEvent>;

/// Consumer half of the per-run event queue.
pub type EventReceiver = mpsc::Receiver<ExecutionEvent>;

/// A bounded, single-consumer, multi-producer event queue.
///
/// `spec.md` §5 ("Queue overflow: bounded at 1000 events; on overflow, drop
/// the newest event and log"). [`EventQueue::sender`] clones are handed to
/// executors and the engine; [`EventQueue::into_receiver`] is drained by a
/// single consumer task.
pub struct EventQueue {
    sender: EventSender,
    receiver: EventReceiver,
}

impl EventQueue {
    /// Build a new queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self { sender, receiver }
    }

    /// Build a new queue with [`DEFAULT_QUEUE_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Clone a producer handle.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Split into `(sender, receiver)`, consuming the queue.
    pub fn into_parts(self) -> (EventSender, EventReceiver) {
        (self.sender, self.receiver)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Push `event` onto `sender` without blocking. On overflow, the event is
/// dropped and a warning is logged; this never blocks the caller and never
/// changes run status (`spec.md` §8 invariant 8).
pub fn try_send(sender: &EventSender, event: ExecutionEvent) {
    if let Err(err) = sender.try_send(event) {
        match err {
            mpsc::error::TrySendError::Full(event) => {
                warn!(event = %event.event, run_id = %event.run_id, "event queue full, dropping event");
            }
            mpsc::error::TrySendError::Closed(event) => {
                warn!(event = %event.event, run_id = %event.run_id, "event queue closed, dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn send_then_receive() {
        let queue = EventQueue::with_capacity(4);
        let sender = queue.sender();
        let (_s, mut receiver) = queue.into_parts();

        try_send(
            &sender,
            ExecutionEvent::new(crate::EventKind::Token, "r1", json!({"content": "hi"})),
        );
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.run_id, "r1");
    }

    #[tokio::test]
    async fn overflow_drops_without_panicking() {
        let queue = EventQueue::with_capacity(1);
        let sender = queue.sender();
        let (_s, mut receiver) = queue.into_parts();

        try_send(
            &sender,
            ExecutionEvent::new(crate::EventKind::Token, "r1", json!({})),
        );
        // Queue is now full (capacity 1, nothing drained yet); this must not panic.
        try_send(
            &sender,
            ExecutionEvent::new(crate::EventKind::Token, "r1", json!({})),
        );
        // Only the first event is observable.
        let received = receiver.recv().await.unwrap();
        assert_eq!(received.run_id, "r1");
        assert!(receiver.try_recv().is_err());
    }
}
