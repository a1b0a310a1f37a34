use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::channel::ChannelType;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};
use twilight_model::voice::VoiceState;

use crate::Error;
use crate::eventbus::EventBus;
use crate::platforms::discord::audio::SoundboardClient;
use crate::platforms::{
    AudioCue,
    AudioCuePlayer,
    ChatSink,
    ConnectionStatus,
    PlatformAuth,
    PlatformIntegration,
};

/// Preferred announcement channel; falls back to the guild's first text
/// channel when no channel carries this name.
const ANNOUNCE_CHANNEL_NAME: &str = "bot-spam";

/// Display name for a voice state's member, falling back to the raw id
/// when the gateway sent no member data.
fn display_name(state: &VoiceState) -> String {
    match &state.member {
        Some(member) => member
            .nick
            .clone()
            .or_else(|| member.user.global_name.clone())
            .unwrap_or_else(|| member.user.name.clone()),
        None => state.user_id.to_string(),
    }
}

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - turns `VoiceStateUpdate`s into `BotEvent::VoicePresence`
///   - updates the in-memory cache.
async fn shard_runner(mut shard: Shard, event_bus: Arc<EventBus>, cache: Arc<InMemoryCache>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                match &event {
                    Event::Ready(ready) => {
                        cache.update(&event);
                        let data: &ReadyPayload = ready.as_ref();
                        info!(
                            "Shard {shard_id} => READY as {} (ID={})",
                            data.user.name, data.user.id
                        );
                    }
                    Event::VoiceStateUpdate(vsu) => {
                        let state: &VoiceState = &vsu.0;
                        let Some(guild_id) = state.guild_id else {
                            cache.update(&event);
                            continue;
                        };
                        if state.member.as_ref().is_some_and(|m| m.user.bot) {
                            debug!("Ignoring bot voice state in guild {guild_id}");
                            cache.update(&event);
                            continue;
                        }

                        // The previous channel must be read before this
                        // event is applied to the cache.
                        let previous_channel = cache
                            .voice_state(state.user_id, guild_id)
                            .map(|vs| vs.channel_id().get() as i64);
                        cache.update(&event);

                        let new_channel = state.channel_id.map(|id| id.get() as i64);
                        let username = display_name(state);

                        event_bus
                            .publish_presence(
                                guild_id.get() as i64,
                                state.user_id.get() as i64,
                                &username,
                                previous_channel,
                                new_channel,
                            )
                            .await;
                    }
                    _ => {
                        cache.update(&event);
                        trace!("Shard {shard_id} => unhandled event: {event:?}");
                    }
                }
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: ConnectionStatus,

    pub shard_tasks: Vec<JoinHandle<()>>,
    pub shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
    pub cache: Option<Arc<InMemoryCache>>,
    pub event_bus: Option<Arc<EventBus>>,

    soundboard: SoundboardClient,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        let soundboard = SoundboardClient::new(token.clone());
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http: None,
            cache: None,
            event_bus: None,
            soundboard,
        }
    }

    pub fn set_event_bus(&mut self, bus: Arc<EventBus>) {
        self.event_bus = Some(bus);
    }
}

#[async_trait]
impl PlatformAuth for DiscordPlatform {
    async fn authenticate(&mut self) -> Result<(), Error> {
        if self.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }
        Ok(())
    }
    async fn refresh_auth(&mut self) -> Result<(), Error> {
        Ok(())
    }
    async fn revoke_auth(&mut self) -> Result<(), Error> {
        Ok(())
    }
    async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(!self.token.is_empty())
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        let Some(event_bus) = self.event_bus.clone() else {
            return Err(Error::Platform("event bus not set before connect".into()));
        };

        // Prepare the Twilight client:
        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        self.http = Some(http_client.clone());

        // Prepare the in-memory cache. VOICE_STATE is what lets the shard
        // runner recover the previous channel of a transition.
        let cache = InMemoryCache::builder()
            .resource_types(ResourceType::GUILD | ResourceType::CHANNEL | ResourceType::VOICE_STATE)
            .build();
        let cache = Arc::new(cache);
        self.cache = Some(cache.clone());

        // Gateway config:
        let config = Config::new(self.token.clone(), Intents::GUILDS | Intents::GUILD_VOICE_STATES);

        // Create recommended shards:
        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let bus_for_shard = event_bus.clone();
            let cache_for_shard = cache.clone();

            // Spawn the shard runner:
            let handle = tokio::spawn(async move {
                shard_runner(shard, bus_for_shard, cache_for_shard).await;
            });
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        // Gracefully close shards
        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        // Wait for them
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();

        Ok(())
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.clone())
    }
}

#[async_trait]
impl ChatSink for DiscordPlatform {
    async fn send_message(
        &self,
        channel_id: i64,
        text: &str,
        delete_after: Option<Duration>,
    ) -> Result<(), Error> {
        let Some(http) = &self.http else {
            return Err(Error::Platform("Discord platform is not connected".into()));
        };
        let channel = Id::<ChannelMarker>::new(channel_id as u64);

        let response = http
            .create_message(channel)
            .content(text)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;

        if let Some(ttl) = delete_after {
            match response.model().await {
                Ok(message) => {
                    let http = http.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(ttl).await;
                        if let Err(e) = http.delete_message(channel, message.id).await {
                            debug!("Auto-delete of message {} failed: {e:?}", message.id);
                        }
                    });
                }
                Err(e) => {
                    debug!("Could not read sent message for auto-delete: {e:?}");
                }
            }
        }

        Ok(())
    }

    fn announce_channel(&self, guild_id: i64) -> Option<i64> {
        let cache = self.cache.as_ref()?;
        let guild = Id::<GuildMarker>::new(guild_id as u64);

        // Collect the ids first; holding the guild-channels reference
        // across further cache lookups is not allowed.
        let channel_ids: Vec<Id<ChannelMarker>> =
            cache.guild_channels(guild)?.iter().copied().collect();

        let mut first_text: Option<(i32, u64)> = None;
        for id in channel_ids {
            let Some(channel) = cache.channel(id) else { continue };
            if channel.kind != ChannelType::GuildText {
                continue;
            }
            if channel.name.as_deref() == Some(ANNOUNCE_CHANNEL_NAME) {
                return Some(id.get() as i64);
            }
            let candidate = (channel.position.unwrap_or(i32::MAX), id.get());
            if first_text.is_none_or(|best| candidate < best) {
                first_text = Some(candidate);
            }
        }
        first_text.map(|(_, id)| id as i64)
    }

    fn channel_name(&self, channel_id: i64) -> Option<String> {
        let cache = self.cache.as_ref()?;
        let channel = cache.channel(Id::<ChannelMarker>::new(channel_id as u64))?;
        channel.name.clone()
    }
}

#[async_trait]
impl AudioCuePlayer for DiscordPlatform {
    async fn list_cues(&self, guild_id: i64) -> Result<Vec<AudioCue>, Error> {
        self.soundboard.list_sounds(guild_id).await
    }

    async fn play_cue(&self, channel_id: i64, cue: &AudioCue) -> Result<(), Error> {
        self.soundboard.send_sound(channel_id, cue).await
    }
}
