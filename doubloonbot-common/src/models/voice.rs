use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one user's presence timeline within one guild. Not globally
/// unique across guilds: the same user in two guilds is two keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub guild_id: i64,
    pub user_id: i64,
}

impl SessionKey {
    pub fn new(guild_id: i64, user_id: i64) -> Self {
        Self { guild_id, user_id }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.guild_id, self.user_id)
    }
}

/// Append-only row recorded for every observed voice-channel join.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoiceJoinRecord {
    pub join_id: Uuid,
    pub guild_id: i64,
    pub user_id: i64,
    pub channel_id: i64,
    pub joined_at: DateTime<Utc>,
}

impl VoiceJoinRecord {
    pub fn new(guild_id: i64, user_id: i64, channel_id: i64) -> Self {
        Self {
            join_id: Uuid::new_v4(),
            guild_id,
            user_id,
            channel_id,
            joined_at: Utc::now(),
        }
    }
}

/// Append-only row written exactly once per completed voice session.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoiceSessionRecord {
    pub session_id: Uuid,
    pub guild_id: i64,
    pub user_id: i64,
    pub channel_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
}
