//! Broadcast fan-out for run progress events
//!
//! The bus is cheap to clone and every handle talks to the same underlying
//! channel, so the sequencer, the scheduler and any number of observers can
//! share one. Delivery is lossy: a subscriber that falls more than the
//! channel capacity behind skips ahead instead of slowing the run down.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::types::{Event, EventEnvelope};

/// Events buffered per subscriber before the slowest one starts losing
/// them. Generous next to what a single run emits.
const DEFAULT_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Wrap `event` in an envelope for `run_id` and hand it to every current
    /// subscriber. Emitting is fire-and-forget: with nobody listening the
    /// event is simply dropped. Returns how many subscribers received it.
    pub fn emit(&self, run_id: Uuid, event: Event) -> usize {
        self.sender
            .send(EventEnvelope::new(run_id, event))
            .unwrap_or(0)
    }

    /// Open a live subscription. Only events emitted after this call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
