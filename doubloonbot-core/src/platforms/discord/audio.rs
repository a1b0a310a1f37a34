//! audio.rs
//!
//! Guild soundboard access over the Discord REST API. twilight-http has
//! no route for soundboard sounds, so this goes through reqwest with the
//! same bot token. Everything here is consumed best-effort: the slot
//! service logs failures and carries on.

use serde::Deserialize;
use tracing::debug;

use crate::Error;
use crate::platforms::AudioCue;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Deserialize)]
struct SoundboardSound {
    sound_id: String,
    name: String,
}

#[derive(Deserialize)]
struct SoundboardSoundList {
    items: Vec<SoundboardSound>,
}

#[derive(Clone)]
pub struct SoundboardClient {
    http: reqwest::Client,
    token: String,
}

impl SoundboardClient {
    pub fn new(token: String) -> Self {
        Self { http: reqwest::Client::new(), token }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Fetch the guild's soundboard sounds.
    pub async fn list_sounds(&self, guild_id: i64) -> Result<Vec<AudioCue>, Error> {
        let url = format!("{DISCORD_API_BASE}/guilds/{guild_id}/soundboard-sounds");
        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?
            .error_for_status()?;

        let list: SoundboardSoundList = resp.json().await?;
        debug!("Guild {guild_id} has {} soundboard sounds", list.items.len());
        Ok(list
            .items
            .into_iter()
            .map(|s| AudioCue { sound_id: s.sound_id, name: s.name })
            .collect())
    }

    /// Play a sound into a voice channel the bot can reach.
    pub async fn send_sound(&self, channel_id: i64, cue: &AudioCue) -> Result<(), Error> {
        let url = format!("{DISCORD_API_BASE}/channels/{channel_id}/send-soundboard-sound");
        self.http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "sound_id": cue.sound_id }))
            .send()
            .await?
            .error_for_status()?;

        debug!("Played soundboard sound '{}' in channel {channel_id}", cue.name);
        Ok(())
    }
}
