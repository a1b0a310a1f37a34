//! Pending slot rolls, at most one per session key.
//!
//! A scheduled roll is a registry entry plus a timer task. The timer
//! does nothing but sleep and enqueue a `RollDue` message; the actual
//! roll runs on the dispatcher task, which is also the only place
//! cancellation happens. That single consumer is what makes
//! cancel-versus-fire race-free: whichever reaches the registry first
//! wins, and the loser's `RollDue` claims nothing.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::games::rarity::RarityTier;
use doubloonbot_common::models::voice::SessionKey;

/// How long after a join the gambling roll fires.
pub const ROLL_DELAY: Duration = Duration::from_secs(120);

/// Context captured at join time, handed back when the roll fires.
#[derive(Debug, Clone)]
pub struct PendingRoll {
    pub rarity: RarityTier,
    pub channel_id: i64,
    pub username: String,
}

/// Timer expiry notification. Carries the roll id so a message from a
/// replaced or cancelled timer can be told apart from the live one.
#[derive(Debug, Clone, Copy)]
pub struct RollDue {
    pub key: SessionKey,
    pub roll_id: Uuid,
}

struct ScheduledRoll {
    roll_id: Uuid,
    pending: PendingRoll,
    timer: JoinHandle<()>,
}

pub struct RollScheduler {
    rolls: DashMap<SessionKey, ScheduledRoll>,
    due_tx: mpsc::UnboundedSender<RollDue>,
    delay: Duration,
}

impl RollScheduler {
    pub fn new(due_tx: mpsc::UnboundedSender<RollDue>) -> Self {
        Self::with_delay(due_tx, ROLL_DELAY)
    }

    pub fn with_delay(due_tx: mpsc::UnboundedSender<RollDue>, delay: Duration) -> Self {
        Self { rolls: DashMap::new(), due_tx, delay }
    }

    /// Register a roll for `key`, firing after the configured delay. An
    /// existing pending roll for the key is replaced: its timer is
    /// aborted and its entry dropped, keeping at most one roll per key.
    pub fn schedule(&self, key: SessionKey, pending: PendingRoll) {
        let roll_id = Uuid::new_v4();
        let tx = self.due_tx.clone();
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RollDue { key, roll_id });
        });

        if let Some(old) = self.rolls.insert(key, ScheduledRoll { roll_id, pending, timer }) {
            debug!("Replacing pending roll for {key}");
            old.timer.abort();
        }
    }

    /// Drop any pending roll for `key` before it fires. Returns whether
    /// there was one.
    pub fn cancel(&self, key: SessionKey) -> bool {
        match self.rolls.remove(&key) {
            Some((_, entry)) => {
                entry.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Take the pending roll for `key` iff `roll_id` still matches the
    /// registry entry. A mismatch (or a missing entry) means the timer
    /// that sent this `RollDue` was cancelled or replaced; it claims
    /// nothing and the entry, if any, stays.
    pub fn claim(&self, key: SessionKey, roll_id: Uuid) -> Option<PendingRoll> {
        self.rolls.remove_if(&key, |_, entry| entry.roll_id == roll_id).map(|(_, e)| e.pending)
    }

    pub fn is_scheduled(&self, key: SessionKey) -> bool {
        self.rolls.contains_key(&key)
    }

    pub fn pending_count(&self) -> usize {
        self.rolls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn key() -> SessionKey {
        SessionKey::new(1, 2)
    }

    fn pending() -> PendingRoll {
        PendingRoll { rarity: RarityTier::Common, channel_id: 7, username: "someone".into() }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_the_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = RollScheduler::new(tx);

        scheduler.schedule(key(), pending());
        assert!(scheduler.is_scheduled(key()));

        advance(ROLL_DELAY).await;
        let due = rx.recv().await.expect("timer should have fired");
        assert_eq!(due.key, key());

        let claimed = scheduler.claim(due.key, due.roll_id);
        assert!(claimed.is_some());
        assert!(!scheduler.is_scheduled(key()));

        // A second claim with the same id finds nothing.
        assert!(scheduler.claim(due.key, due.roll_id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = RollScheduler::new(tx);

        scheduler.schedule(key(), pending());
        assert!(scheduler.cancel(key()));
        assert!(!scheduler.is_scheduled(key()));

        advance(ROLL_DELAY).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "cancelled timer must not enqueue");

        // Cancelling again reports nothing to cancel.
        assert!(!scheduler.cancel(key()));
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_replaces_and_stales_the_old_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = RollScheduler::new(tx);

        scheduler.schedule(key(), pending());
        let first_id = scheduler.rolls.get(&key()).unwrap().roll_id;

        scheduler.schedule(key(), pending());
        assert_eq!(scheduler.pending_count(), 1);

        // The old id no longer claims anything.
        assert!(scheduler.claim(key(), first_id).is_none());
        assert!(scheduler.is_scheduled(key()));

        advance(ROLL_DELAY).await;
        let due = rx.recv().await.unwrap();
        assert!(scheduler.claim(due.key, due.roll_id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn a_due_message_after_cancel_claims_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = RollScheduler::new(tx);

        scheduler.schedule(key(), pending());
        advance(ROLL_DELAY).await;
        let due = rx.recv().await.unwrap();

        // The leave lands between fire and processing.
        assert!(scheduler.cancel(due.key));
        assert!(scheduler.claim(due.key, due.roll_id).is_none());
    }
}
