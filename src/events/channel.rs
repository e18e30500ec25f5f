//! Event channel implementation using crossbeam-channel.
//!
//! Staging workers and the committer publish through an [`EventSender`];
//! whatever UI is attached drains the [`EventReceiver`].

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use super::{CommitEvent, Event, StageEvent};

/// Sends events from the core library.
///
/// Cheap to clone and safe to move into worker threads.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender.
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Send an event without blocking.
    ///
    /// A dropped receiver or a full bounded channel is not an error: the
    /// event is discarded and the pipeline keeps going.
    pub fn send(&self, event: Event) {
        if let Err(TrySendError::Full(_)) = self.inner.try_send(event) {
            tracing::trace!("Event channel full, dropping event");
        }
    }

    /// Shorthand for [`Event::Stage`].
    pub fn stage(&self, event: StageEvent) {
        self.send(Event::Stage(event));
    }

    /// Shorthand for [`Event::Commit`].
    pub fn commit(&self, event: CommitEvent) {
        self.send(Event::Commit(event));
    }
}

/// Receives events from the core library.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for connected sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded channel; events beyond `capacity` are dropped until the receiver drains.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone. Every event is discarded.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
