use tokio::sync::broadcast;

use parley_types::events::PushEvent;

/// Source of decoded push events for the active session.
///
/// Connection, reconnect and frame decoding are the transport's problem;
/// by the time an event reaches this seam it is already a [`PushEvent`].
/// The store subscribes one receiver per conversation binding.
pub trait RealtimeChannel: Send + Sync {
    /// New receiver positioned at the stream's current tail.
    fn subscribe(&self) -> broadcast::Receiver<PushEvent>;
}

/// Fan-out feed a transport publishes decoded events into.
///
/// Cloneable handle around a single broadcast channel: the transport keeps
/// one clone to publish on, the store holds another as its
/// [`RealtimeChannel`].
#[derive(Clone)]
pub struct PushFeed {
    tx: broadcast::Sender<PushEvent>,
}

impl PushFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish one event to every bound subscriber. Events published while
    /// nothing is bound are dropped.
    pub fn publish(&self, event: PushEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for PushFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl RealtimeChannel for PushFeed {
    fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }
}
