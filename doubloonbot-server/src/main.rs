use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use doubloonbot_core::Database;
use doubloonbot_core::Error;
use doubloonbot_core::eventbus::{BotEvent, EventBus};
use doubloonbot_core::platforms::discord::DiscordPlatform;
use doubloonbot_core::platforms::{AudioCuePlayer, ChatSink, PlatformAuth, PlatformIntegration};
use doubloonbot_core::repositories::postgres::{
    PostgresEconomyRepository,
    PostgresVoiceHistoryRepository,
};
use doubloonbot_core::repositories::{EconomyRepo, VoiceHistoryRepo};
use doubloonbot_core::services::{DailyRewardService, PresenceService, SlotService};

#[derive(Parser, Debug, Clone)]
#[command(name = "doubloonbot")]
#[command(author, version, about = "Doubloonbot - voice-presence bot with a slot minigame")]
struct Args {
    /// Postgres connection URL.
    #[arg(long, default_value = "postgres://doubloon@localhost:5432/doubloonbot")]
    db_url: String,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("doubloonbot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("Doubloonbot starting.");

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run_server(args: Args) -> Result<(), Error> {
    // 1) Connect to Postgres and bring the schema up to date.
    info!("Using Postgres DB URL: {}", args.db_url);
    let db = Database::new(&args.db_url).await?;
    db.migrate().await?;

    // 2) Event bus.
    let event_bus = Arc::new(EventBus::new());

    // 3) Repositories.
    let economy: Arc<dyn EconomyRepo> =
        Arc::new(PostgresEconomyRepository::new(db.pool().clone()));
    let voice_history: Arc<dyn VoiceHistoryRepo> =
        Arc::new(PostgresVoiceHistoryRepository::new(db.pool().clone()));

    // 4) Discord platform. The dispatcher subscribes before the shards
    //    connect so no presence event can slip past it.
    let token = std::env::var("DISCORD_TOKEN")
        .map_err(|_| Error::Auth("DISCORD_TOKEN is not set".into()))?;
    let mut platform = DiscordPlatform::new(token);
    platform.set_event_bus(event_bus.clone());
    platform.authenticate().await?;

    let events_rx = event_bus.subscribe(None).await;

    platform.connect().await?;
    let platform = Arc::new(platform);
    let chat: Arc<dyn ChatSink> = platform.clone();
    let audio: Arc<dyn AudioCuePlayer> = platform.clone();

    // 5) Services and the dispatcher task.
    let slots = Arc::new(SlotService::new(economy.clone(), audio));
    let daily = Arc::new(DailyRewardService::new(economy.clone()));
    let presence = Arc::new(PresenceService::new(voice_history, slots, daily, chat));

    let dispatcher = {
        let presence = presence.clone();
        let shutdown_rx = event_bus.shutdown_rx.clone();
        tokio::spawn(async move {
            presence.run(events_rx, shutdown_rx).await;
        })
    };

    // 6) Handle Ctrl-C to signal shutdown.
    let eb_clone = event_bus.clone();
    let _ctrlc_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
        }
        info!("Ctrl-C detected; shutting down event bus...");
        eb_clone.shutdown();
    });

    // 7) Main loop.
    let mut shutdown_rx = event_bus.shutdown_rx.clone();
    loop {
        tokio::select! {
            _ = time::sleep(Duration::from_secs(10)) => {
                event_bus.publish(BotEvent::Tick).await;
            }
            Ok(_) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Shutdown signaled; exiting server loop.");
                    break;
                }
            }
        }
    }

    // 8) Wind the dispatcher down.
    let _ = dispatcher.await;

    Ok(())
}
