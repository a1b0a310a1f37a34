// tests/common/mod.rs
//
// In-memory fakes for the repository traits and the chat surface.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use doubloonbot_common::models::economy::SlotSpinRecord;
use doubloonbot_common::models::voice::{VoiceJoinRecord, VoiceSessionRecord};
use doubloonbot_core::Error;
use doubloonbot_core::platforms::{AudioCue, AudioCuePlayer, ChatSink};
use doubloonbot_core::repositories::{EconomyRepo, VoiceHistoryRepo};

/// Economy repository backed by in-memory maps, mirroring the SQL
/// semantics (atomic-increment credit, conditional daily claim).
#[derive(Default)]
pub struct MemoryEconomyRepo {
    pub balances: Mutex<HashMap<i64, i64>>,
    pub last_reward: Mutex<HashMap<i64, NaiveDate>>,
    pub spins: Mutex<Vec<SlotSpinRecord>>,
}

impl MemoryEconomyRepo {
    pub fn balance(&self, user_id: i64) -> i64 {
        *self.balances.lock().unwrap().get(&user_id).unwrap_or(&0)
    }

    pub fn spin_count(&self) -> usize {
        self.spins.lock().unwrap().len()
    }
}

#[async_trait]
impl EconomyRepo for MemoryEconomyRepo {
    async fn get_balance(&self, user_id: i64) -> Result<i64, Error> {
        Ok(self.balance(user_id))
    }

    async fn credit(&self, user_id: i64, amount: i64) -> Result<(), Error> {
        *self.balances.lock().unwrap().entry(user_id).or_insert(0) += amount;
        Ok(())
    }

    async fn claim_daily_reward(&self, user_id: i64, today: NaiveDate) -> Result<bool, Error> {
        let mut map = self.last_reward.lock().unwrap();
        if map.get(&user_id) == Some(&today) {
            return Ok(false);
        }
        map.insert(user_id, today);
        Ok(true)
    }

    async fn insert_slot_spin(&self, spin: &SlotSpinRecord) -> Result<(), Error> {
        self.spins.lock().unwrap().push(spin.clone());
        Ok(())
    }
}

/// Voice history backed by vectors and a totals map.
#[derive(Default)]
pub struct MemoryVoiceHistoryRepo {
    pub joins: Mutex<Vec<VoiceJoinRecord>>,
    pub sessions: Mutex<Vec<VoiceSessionRecord>>,
    pub totals: Mutex<HashMap<(i64, i64), i64>>,
}

impl MemoryVoiceHistoryRepo {
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn total_seconds(&self, guild_id: i64, user_id: i64) -> i64 {
        *self.totals.lock().unwrap().get(&(guild_id, user_id)).unwrap_or(&0)
    }
}

#[async_trait]
impl VoiceHistoryRepo for MemoryVoiceHistoryRepo {
    async fn insert_voice_join(&self, join: &VoiceJoinRecord) -> Result<(), Error> {
        self.joins.lock().unwrap().push(join.clone());
        Ok(())
    }

    async fn insert_voice_session(&self, session: &VoiceSessionRecord) -> Result<(), Error> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn add_voice_seconds(
        &self,
        guild_id: i64,
        user_id: i64,
        seconds: i64,
    ) -> Result<(), Error> {
        *self.totals.lock().unwrap().entry((guild_id, user_id)).or_insert(0) += seconds;
        Ok(())
    }

    async fn get_total_seconds(&self, guild_id: i64, user_id: i64) -> Result<i64, Error> {
        Ok(self.total_seconds(guild_id, user_id))
    }
}

/// Chat sink that records every outbound message.
pub struct RecordingChatSink {
    pub announce_target: i64,
    pub sent: Mutex<Vec<(i64, String, Option<Duration>)>>,
}

impl RecordingChatSink {
    pub fn new(announce_target: i64) -> Self {
        Self { announce_target, sent: Mutex::new(Vec::new()) }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, text, _)| text.clone()).collect()
    }
}

#[async_trait]
impl ChatSink for RecordingChatSink {
    async fn send_message(
        &self,
        channel_id: i64,
        text: &str,
        delete_after: Option<Duration>,
    ) -> Result<(), Error> {
        self.sent.lock().unwrap().push((channel_id, text.to_string(), delete_after));
        Ok(())
    }

    fn announce_channel(&self, _guild_id: i64) -> Option<i64> {
        Some(self.announce_target)
    }

    fn channel_name(&self, channel_id: i64) -> Option<String> {
        Some(format!("vc-{channel_id}"))
    }
}

/// Audio player with no sounds available; `play_cue` would fail the
/// test if anything ever tried to play from an empty board.
pub struct SilentAudio;

#[async_trait]
impl AudioCuePlayer for SilentAudio {
    async fn list_cues(&self, _guild_id: i64) -> Result<Vec<AudioCue>, Error> {
        Ok(Vec::new())
    }

    async fn play_cue(&self, _channel_id: i64, _cue: &AudioCue) -> Result<(), Error> {
        Err(Error::Platform("no cues to play".into()))
    }
}
