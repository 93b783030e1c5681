//! Startup configuration, resolved once from the process environment.

use std::env;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serenity::model::id::ChannelId;
use tracing::warn;

/// Backing file used when `VOICELOG_COUNTERS_FILE` is not set.
const DEFAULT_COUNTERS_FILE: &str = "counters.json";

/// Everything the bot reads from the environment. Resolved once at startup
/// and passed along explicitly instead of re-read per event.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Announcement destination. `None` disables announcements, never
    /// counting.
    pub log_channel: Option<ChannelId>,
    pub counters_path: PathBuf,
}

impl BotConfig {
    /// Read the configuration. Only the token is required; a missing or
    /// unparsable `LOG_CHANNEL_ID` disables announcements instead of failing
    /// startup.
    pub fn from_env() -> Result<Self> {
        let token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;

        let log_channel = match env::var("LOG_CHANNEL_ID") {
            Ok(raw) => {
                let channel = parse_channel_id(&raw);
                if channel.is_none() {
                    warn!(value = %raw, "LOG_CHANNEL_ID is not a channel id, announcements disabled");
                }
                channel
            }
            Err(_) => {
                warn!("LOG_CHANNEL_ID not set, announcements disabled");
                None
            }
        };

        let counters_path = env::var("VOICELOG_COUNTERS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_COUNTERS_FILE));

        Ok(Self {
            token,
            log_channel,
            counters_path,
        })
    }
}

/// Parse a decimal channel id. Zero is not a valid snowflake.
fn parse_channel_id(raw: &str) -> Option<ChannelId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|&id| id != 0)
        .map(ChannelId::new)
}
