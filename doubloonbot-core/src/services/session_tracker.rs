//! Per-key voice session state.
//!
//! A key is either absent (not in voice) or holds exactly one
//! `ActiveSession`. Channel-to-channel switches never touch this
//! registry; occupancy is continuous across them. Durations come from a
//! monotonic instant rather than wall-clock subtraction.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use doubloonbot_common::models::voice::{SessionKey, VoiceSessionRecord};

#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub key: SessionKey,
    pub channel_id: i64,
    pub username: String,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

/// A finished session, ready to be persisted.
#[derive(Debug, Clone)]
pub struct ClosedSession {
    pub key: SessionKey,
    pub channel_id: i64,
    pub username: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl ClosedSession {
    pub fn to_record(&self) -> VoiceSessionRecord {
        VoiceSessionRecord {
            session_id: Uuid::new_v4(),
            guild_id: self.key.guild_id,
            user_id: self.key.user_id,
            channel_id: self.channel_id,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_seconds: self.duration_seconds,
        }
    }
}

#[derive(Default)]
pub struct SessionTracker {
    sessions: DashMap<SessionKey, ActiveSession>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self { sessions: DashMap::new() }
    }

    /// Open a session for `key`. Returns a session that was still open
    /// for the key, which callers are expected to have closed already
    /// (the dispatcher closes before reopening, so a `Some` here means a
    /// bug upstream).
    pub fn begin(&self, key: SessionKey, channel_id: i64, username: &str) -> Option<ActiveSession> {
        let session = ActiveSession {
            key,
            channel_id,
            username: username.to_string(),
            started_at: Utc::now(),
            started: Instant::now(),
        };
        self.sessions.insert(key, session)
    }

    /// Close the session for `key`, computing its duration. `None` when
    /// no session is open (duplicate or out-of-order leave).
    pub fn end(&self, key: SessionKey) -> Option<ClosedSession> {
        let (_, session) = self.sessions.remove(&key)?;
        Some(ClosedSession {
            key: session.key,
            channel_id: session.channel_id,
            username: session.username,
            started_at: session.started_at,
            ended_at: Utc::now(),
            duration_seconds: session.started.elapsed().as_secs() as i64,
        })
    }

    pub fn is_active(&self, key: SessionKey) -> bool {
        self.sessions.contains_key(&key)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
