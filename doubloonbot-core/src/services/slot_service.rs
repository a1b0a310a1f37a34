//! Slot roll orchestration: sample a grid, settle it against the
//! ledger, build the announcement.
//!
//! Persistence and the celebratory sound are best-effort relative to the
//! user-facing result: a failed insert or credit is logged and the
//! announcement still goes out.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::games::rarity::RarityTier;
use crate::games::slots::{self, SlotGrid, SpinOutcome};
use crate::platforms::AudioCuePlayer;
use crate::repositories::EconomyRepo;
use doubloonbot_common::models::economy::SlotSpinRecord;
use doubloonbot_common::models::voice::SessionKey;

pub struct SpinReport {
    pub grid: SlotGrid,
    pub outcome: SpinOutcome,
    pub message: String,
}

pub struct SlotService {
    economy: Arc<dyn EconomyRepo>,
    audio: Arc<dyn AudioCuePlayer>,
}

impl SlotService {
    pub fn new(economy: Arc<dyn EconomyRepo>, audio: Arc<dyn AudioCuePlayer>) -> Self {
        Self { economy, audio }
    }

    /// Roll the reels for a user and settle the result.
    pub async fn spin_for(
        &self,
        key: SessionKey,
        username: &str,
        channel_id: i64,
        rarity: RarityTier,
    ) -> SpinReport {
        let grid = slots::spin(&mut rand::rng());
        self.settle(grid, key, username, channel_id, rarity).await
    }

    /// Settle a known grid: persist the spin, credit any payout, fire
    /// the celebration. Split from `spin_for` so tests can hand in a
    /// crafted grid.
    pub async fn settle(
        &self,
        grid: SlotGrid,
        key: SessionKey,
        username: &str,
        channel_id: i64,
        rarity: RarityTier,
    ) -> SpinReport {
        let outcome = slots::evaluate(&grid);

        let record = SlotSpinRecord {
            spin_id: Uuid::new_v4(),
            guild_id: key.guild_id,
            user_id: key.user_id,
            rarity: rarity.as_str().to_string(),
            grid: serde_json::to_value(grid).unwrap_or_default(),
            win: outcome.win,
            symbol: outcome.symbol.map(|s| format!("{s:?}")),
            payout: outcome.payout,
            rolled_at: Utc::now(),
        };
        if let Err(e) = self.economy.insert_slot_spin(&record).await {
            warn!("Failed to persist slot spin for {key}: {e:?}");
        }

        if outcome.payout > 0 {
            if let Err(e) = self.economy.credit(key.user_id, outcome.payout).await {
                warn!("Failed to credit {} doubloons to {}: {e:?}", outcome.payout, key.user_id);
            }
            self.play_celebration(key.guild_id, channel_id).await;
        }

        let message = format_spin_message(username, &grid, &outcome);
        SpinReport { grid, outcome, message }
    }

    /// Random soundboard cue in the user's voice channel. Fully
    /// best-effort; a guild without sounds is silent, not an error.
    async fn play_celebration(&self, guild_id: i64, channel_id: i64) {
        let cues = match self.audio.list_cues(guild_id).await {
            Ok(cues) => cues,
            Err(e) => {
                debug!("Could not list soundboard cues for guild {guild_id}: {e:?}");
                return;
            }
        };
        let cue = {
            let mut rng = rand::rng();
            cues.choose(&mut rng).cloned()
        };
        let Some(cue) = cue else { return };
        if let Err(e) = self.audio.play_cue(channel_id, &cue).await {
            debug!("Could not play soundboard cue '{}': {e:?}", cue.name);
        }
    }
}

fn format_spin_message(username: &str, grid: &SlotGrid, outcome: &SpinOutcome) -> String {
    let rows: Vec<String> = grid
        .iter()
        .map(|row| row.iter().map(|s| s.emoji()).collect::<Vec<_>>().join(" "))
        .collect();
    let board = rows.join("\n");

    match outcome.symbol {
        Some(symbol) => format!(
            "\u{1F3B0} {username} lined up three {}! +{} doubloons\n{board}",
            symbol.emoji(),
            outcome.payout
        ),
        None => format!("\u{1F3B0} {username} spun the reels... nothing lined up.\n{board}"),
    }
}
