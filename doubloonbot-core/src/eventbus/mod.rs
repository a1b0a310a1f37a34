//! src/eventbus/mod.rs
//!
//! Provides an in-process event bus that supports guaranteed delivery
//! to multiple subscribers via bounded MPSC queues.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc, watch};

/// Global event type that various parts of the bot can publish or subscribe to.
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// A raw voice-presence transition observed on the chat platform.
    /// `previous_channel`/`new_channel` are `None` when the user was/is in
    /// no voice channel; classification into join/leave/switch happens in
    /// the presence dispatcher, not here.
    VoicePresence {
        guild_id: i64,
        user_id: i64,
        username: String,
        previous_channel: Option<i64>,
        new_channel: Option<i64>,
        timestamp: DateTime<Utc>,
    },

    /// Periodic heartbeat event.
    Tick,

    /// System-wide event for debugging or administration.
    SystemMessage(String),
}

impl BotEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            BotEvent::VoicePresence { .. } => "voice_presence",
            BotEvent::Tick => "tick",
            BotEvent::SystemMessage(_) => "system_message",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<BotEvent>` for guaranteed delivery.
///
/// - If the subscriber's channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, the channel is closed
///   and sending returns an error.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<BotEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer.
const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    /// Create a new, empty event bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered. Delivery to a
    /// single subscriber preserves publish order, which is what keeps
    /// presence events for one session key ordered downstream.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<BotEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: BotEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }

    /// Convenience method: publish a `VoicePresence` event.
    pub async fn publish_presence(
        &self,
        guild_id: i64,
        user_id: i64,
        username: &str,
        previous_channel: Option<i64>,
        new_channel: Option<i64>,
    ) {
        let event = BotEvent::VoicePresence {
            guild_id,
            user_id,
            username: username.to_string(),
            previous_channel,
            new_channel,
            timestamp: Utc::now(),
        };
        self.publish(event).await;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep, timeout};

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish(BotEvent::Tick).await;

        // Both subscribers should get it
        let evt1 = rx1.recv().await.expect("rx1 should get event");
        let evt2 = rx2.recv().await.expect("rx2 should get event");

        match evt1 {
            BotEvent::Tick => { /* OK */ }
            _ => panic!("rx1 got the wrong event type"),
        }
        match evt2 {
            BotEvent::Tick => { /* OK */ }
            _ => panic!("rx2 got the wrong event type"),
        }
    }

    #[tokio::test]
    async fn test_presence_events_arrive_in_publish_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(16)).await;

        // Join then leave for the same key must never be reordered.
        bus.publish_presence(1, 42, "someone", None, Some(7)).await;
        bus.publish_presence(1, 42, "someone", Some(7), None).await;

        match rx.recv().await.unwrap() {
            BotEvent::VoicePresence { previous_channel: None, new_channel: Some(7), .. } => {}
            other => panic!("expected the join first, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            BotEvent::VoicePresence { previous_channel: Some(7), new_channel: None, .. } => {}
            other => panic!("expected the leave second, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_drop_when_queue_is_full() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await;

        // Fill the queue.
        bus.publish(BotEvent::SystemMessage("first".into())).await;

        // Spawn a task that sleeps and then reads both messages.
        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let first_evt = rx.recv().await.unwrap();
            let second_evt = rx.recv().await.unwrap();
            (first_evt, second_evt)
        });

        // Attempt to publish the second message (must wait until the subscriber reads).
        let publish_fut = bus.publish(BotEvent::SystemMessage("second".into()));
        let publish_res = timeout(Duration::from_millis(300), publish_fut).await;
        assert!(publish_res.is_ok(), "publish should eventually succeed");

        let (evt1, evt2) = handle.await.unwrap();
        if let BotEvent::SystemMessage(txt) = evt1 {
            assert_eq!(txt, "first");
        } else {
            panic!("First message mismatch");
        }
        if let BotEvent::SystemMessage(txt) = evt2 {
            assert_eq!(txt, "second");
        } else {
            panic!("Second message mismatch");
        }
    }
}
