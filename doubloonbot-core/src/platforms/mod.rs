// src/platforms/mod.rs

use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

pub mod discord;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

#[async_trait]
pub trait PlatformAuth {
    async fn authenticate(&mut self) -> Result<(), Error>;
    async fn refresh_auth(&mut self) -> Result<(), Error>;
    async fn revoke_auth(&mut self) -> Result<(), Error>;
    async fn is_authenticated(&self) -> Result<bool, Error>;
}

#[async_trait]
pub trait PlatformIntegration {
    async fn connect(&mut self) -> Result<(), Error>;
    async fn disconnect(&mut self) -> Result<(), Error>;
    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error>;
}

/// Outbound message surface the services talk to. Kept narrow so tests
/// can drop in a recording fake.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Send `text` to a channel. With `delete_after` set the message is
    /// removed again once the duration elapses, best-effort.
    async fn send_message(
        &self,
        channel_id: i64,
        text: &str,
        delete_after: Option<Duration>,
    ) -> Result<(), Error>;

    /// The channel announcements go to for this guild: a text channel
    /// named "bot-spam" when one exists, otherwise the guild's first
    /// text channel.
    fn announce_channel(&self, guild_id: i64) -> Option<i64>;

    /// Human-readable channel name, if known.
    fn channel_name(&self, channel_id: i64) -> Option<String>;
}

/// One playable celebratory sound.
#[derive(Debug, Clone)]
pub struct AudioCue {
    pub sound_id: String,
    pub name: String,
}

/// Celebratory audio, strictly best-effort: callers log failures and
/// move on, nothing here feeds back into game outcomes.
#[async_trait]
pub trait AudioCuePlayer: Send + Sync {
    async fn list_cues(&self, guild_id: i64) -> Result<Vec<AudioCue>, Error>;
    async fn play_cue(&self, channel_id: i64, cue: &AudioCue) -> Result<(), Error>;
}
