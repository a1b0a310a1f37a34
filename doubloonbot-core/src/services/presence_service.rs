//! The presence dispatcher: one task that consumes voice transitions
//! from the event bus and roll-timer expiries from the scheduler queue,
//! and drives everything else.
//!
//! Events for one session key arrive in publish order and are handled to
//! completion before the next one, so join/leave for a key never
//! reorder. Every external call inside a handler is caught and logged;
//! nothing thrown here can take the loop down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::eventbus::BotEvent;
use crate::games::rarity::{join_phrase, pick_rarity};
use crate::platforms::ChatSink;
use crate::repositories::VoiceHistoryRepo;
use crate::services::daily_reward::{DAILY_REWARD_AMOUNT, DailyRewardService};
use crate::services::roll_scheduler::{PendingRoll, RollDue, RollScheduler};
use crate::services::session_tracker::{ClosedSession, SessionTracker};
use crate::services::slot_service::SlotService;
use doubloonbot_common::models::voice::{SessionKey, VoiceJoinRecord};

/// Join announcements delete themselves after this long.
pub const ANNOUNCE_TTL: Duration = Duration::from_secs(300);

/// What a raw before/after channel pair means for the session machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Join { channel_id: i64 },
    Leave,
    Switch { from: i64, to: i64 },
    Noop,
}

/// Classify a transition. Duplicate events (identical before/after,
/// including none/none) come out as `Noop`, never as an error.
pub fn classify(previous_channel: Option<i64>, new_channel: Option<i64>) -> Transition {
    match (previous_channel, new_channel) {
        (None, Some(channel_id)) => Transition::Join { channel_id },
        (Some(_), None) => Transition::Leave,
        (Some(from), Some(to)) if from != to => Transition::Switch { from, to },
        _ => Transition::Noop,
    }
}

pub struct PresenceService {
    tracker: SessionTracker,
    scheduler: RollScheduler,
    slots: Arc<SlotService>,
    daily: Arc<DailyRewardService>,
    voice_repo: Arc<dyn VoiceHistoryRepo>,
    chat: Arc<dyn ChatSink>,

    /// Receiver for the scheduler's timer expiries; taken by the run
    /// loop (or a test) through `next_roll_due`.
    roll_rx: Mutex<Option<mpsc::UnboundedReceiver<RollDue>>>,
}

impl PresenceService {
    pub fn new(
        voice_repo: Arc<dyn VoiceHistoryRepo>,
        slots: Arc<SlotService>,
        daily: Arc<DailyRewardService>,
        chat: Arc<dyn ChatSink>,
    ) -> Self {
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        Self {
            tracker: SessionTracker::new(),
            scheduler: RollScheduler::new(due_tx),
            slots,
            daily,
            voice_repo,
            chat,
            roll_rx: Mutex::new(Some(due_rx)),
        }
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &RollScheduler {
        &self.scheduler
    }

    /// Await the next timer expiry.
    pub async fn next_roll_due(&self) -> Option<RollDue> {
        let mut guard = self.roll_rx.lock().await;
        match guard.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Drive the dispatcher until the bus closes or shutdown is
    /// signalled.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<BotEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("(PresenceService) dispatcher started.");
        loop {
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.handle_event(&event).await,
                    None => {
                        warn!("(PresenceService) event stream closed; stopping.");
                        break;
                    }
                },
                Some(due) = self.next_roll_due() => {
                    self.handle_roll_due(due).await;
                }
                Ok(_) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("(PresenceService) shutdown signalled; stopping.");
                        break;
                    }
                }
            }
        }
    }

    pub async fn handle_event(&self, event: &BotEvent) {
        let BotEvent::VoicePresence {
            guild_id,
            user_id,
            username,
            previous_channel,
            new_channel,
            ..
        } = event
        else {
            trace!("(PresenceService) ignoring {} event", event.event_type());
            return;
        };

        let key = SessionKey::new(*guild_id, *user_id);
        match classify(*previous_channel, *new_channel) {
            Transition::Join { channel_id } => self.on_join(key, channel_id, username).await,
            Transition::Leave => self.on_leave(key).await,
            Transition::Switch { from, to } => {
                trace!("{key} switched channels {from} -> {to}; session continues");
            }
            Transition::Noop => {
                trace!("Duplicate/no-op presence event for {key}");
            }
        }
    }

    async fn on_join(&self, key: SessionKey, channel_id: i64, username: &str) {
        // A join with a session still open means we never saw the leave.
        // Close the old session exactly as a leave would have, then
        // start fresh, so no duration is silently lost.
        if self.tracker.is_active(key) {
            warn!("Join for {key} with a session already open; closing the old session first");
            self.scheduler.cancel(key);
            if let Some(closed) = self.tracker.end(key) {
                self.finalize_session(closed).await;
            }
        }
        if self.tracker.begin(key, channel_id, username).is_some() {
            warn!("Displaced an open session for {key} while beginning a new one");
        }

        let join_row = VoiceJoinRecord::new(key.guild_id, key.user_id, channel_id);
        if let Err(e) = self.voice_repo.insert_voice_join(&join_row).await {
            warn!("Failed to record voice join for {key}: {e:?}");
        }

        // Announcement. The rarity draw is pure; it does not depend on
        // anything persisted.
        let (rarity, phrase) = {
            let mut rng = rand::rng();
            let rarity = pick_rarity(&mut rng);
            (rarity, join_phrase(rarity, &mut rng))
        };
        let channel_label =
            self.chat.channel_name(channel_id).unwrap_or_else(|| channel_id.to_string());
        let text = format!("\u{1F514} {username} {phrase} {channel_label}");
        match self.chat.announce_channel(key.guild_id) {
            Some(target) => {
                if let Err(e) = self.chat.send_message(target, &text, Some(ANNOUNCE_TTL)).await {
                    warn!("Failed to announce join for {key}: {e:?}");
                }
            }
            None => debug!("No text channel to announce in for guild {}", key.guild_id),
        }

        self.scheduler.schedule(
            key,
            PendingRoll { rarity, channel_id, username: username.to_string() },
        );

        // Daily reward, isolated from the join flow: by this point the
        // announcement is out and the roll is scheduled, and any failure
        // here is logged, not propagated.
        match self.daily.grant_if_eligible(key.user_id).await {
            Ok(true) => {
                if let Some(target) = self.chat.announce_channel(key.guild_id) {
                    let text = format!(
                        "\u{1F4B0} {username} collected their daily {DAILY_REWARD_AMOUNT} doubloons!"
                    );
                    if let Err(e) = self.chat.send_message(target, &text, Some(ANNOUNCE_TTL)).await
                    {
                        debug!("Failed to announce daily reward for {key}: {e:?}");
                    }
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Daily reward check failed for {}: {e:?}", key.user_id),
        }
    }

    async fn on_leave(&self, key: SessionKey) {
        if self.scheduler.cancel(key) {
            debug!("Cancelled pending roll for {key}");
        }
        match self.tracker.end(key) {
            Some(closed) => self.finalize_session(closed).await,
            // Duplicate or out-of-order leave; expected in the wild.
            None => warn!("Leave for {key} with no active session; ignoring"),
        }
    }

    async fn finalize_session(&self, closed: ClosedSession) {
        let record = closed.to_record();
        if let Err(e) = self.voice_repo.insert_voice_session(&record).await {
            warn!("Failed to persist voice session for {}: {e:?}", closed.key);
        }
        if let Err(e) = self
            .voice_repo
            .add_voice_seconds(closed.key.guild_id, closed.key.user_id, closed.duration_seconds)
            .await
        {
            warn!("Failed to update voice totals for {}: {e:?}", closed.key);
        }
        info!(
            "Closed voice session for {} in channel {} after {}s",
            closed.key, closed.channel_id, closed.duration_seconds
        );
    }

    pub async fn handle_roll_due(&self, due: RollDue) {
        let Some(pending) = self.scheduler.claim(due.key, due.roll_id) else {
            trace!("Stale roll timer for {}; nothing to do", due.key);
            return;
        };
        if !self.tracker.is_active(due.key) {
            debug!("Roll due for {} but the user already left", due.key);
            return;
        }

        let report = self
            .slots
            .spin_for(due.key, &pending.username, pending.channel_id, pending.rarity)
            .await;

        match self.chat.announce_channel(due.key.guild_id) {
            Some(target) => {
                if let Err(e) = self.chat.send_message(target, &report.message, None).await {
                    warn!("Failed to announce slot result for {}: {e:?}", due.key);
                }
            }
            None => debug!("No text channel for slot result in guild {}", due.key.guild_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_the_four_transitions() {
        assert_eq!(classify(None, Some(5)), Transition::Join { channel_id: 5 });
        assert_eq!(classify(Some(5), None), Transition::Leave);
        assert_eq!(classify(Some(5), Some(6)), Transition::Switch { from: 5, to: 6 });
        assert_eq!(classify(None, None), Transition::Noop);
        // Duplicate event: same channel on both sides.
        assert_eq!(classify(Some(5), Some(5)), Transition::Noop);
    }
}
