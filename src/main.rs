use serenity::Client;
use serenity::all::GatewayIntents;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use voicelog::config::BotConfig;
use voicelog::handler::VoiceLogger;
use voicelog::store::{CounterStore, JsonCounterStore, SharedCounterStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicelog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BotConfig::from_env()?;
    let store: Arc<dyn CounterStore> = Arc::new(JsonCounterStore::new(&config.counters_path));

    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let mut client = Client::builder(&config.token, intents)
        .event_handler(VoiceLogger::new(config.log_channel))
        .type_map_insert::<SharedCounterStore>(store)
        .await?;

    info!(counters = %config.counters_path.display(), "starting voicelog");

    if let Err(why) = client.start().await {
        error!(error = %why, "client error");
    }

    Ok(())
}
