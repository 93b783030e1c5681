//! Gateway wiring: command registration, the voice event pipeline and
//! interaction dispatch.

use serenity::async_trait;
use serenity::all::Command;
use serenity::all::CreateMessage;
use serenity::all::Interaction;
use serenity::all::Ready;
use serenity::model::id::{ChannelId, UserId};
use serenity::model::voice::VoiceState;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::classify::{Transition, classify};
use crate::commands;
use crate::notify::Notification;
use crate::store::{CounterStore, SharedCounterStore, StoreError};

/// The slice of a voice state update the pipeline works with, validated once
/// at the gateway boundary.
#[derive(Debug, Clone)]
pub struct VoiceEvent {
    pub user_id: UserId,
    /// Display name captured for the counter record.
    pub display_name: String,
    pub before: Option<ChannelId>,
    pub after: Option<ChannelId>,
}

impl VoiceEvent {
    /// Extract the pipeline view of a raw voice state pair. Updates without
    /// member data carry no usable name and are dropped.
    pub fn from_update(old: Option<&VoiceState>, new: &VoiceState) -> Option<Self> {
        let member = new.member.as_ref()?;
        Some(Self {
            user_id: new.user_id,
            display_name: member.user.tag(),
            before: old.and_then(|state| state.channel_id),
            after: new.channel_id,
        })
    }
}

/// Apply a classified event to the store: refresh the display name, bump the
/// matching counter and rewrite the document. No-ops touch nothing.
pub fn record_transition(
    store: &dyn CounterStore,
    event: &VoiceEvent,
    transition: &Transition,
) -> Result<(), StoreError> {
    let Some(counter) = transition.counter() else {
        return Ok(());
    };

    let user_id = event.user_id.to_string();
    let mut doc = store.load()?;
    doc.ensure_user(&user_id, &event.display_name);
    doc.increment(&user_id, counter);
    store.save(&doc)
}

/// The bot's event handler. Counting always runs; announcements only go out
/// when a log channel was resolved at startup.
pub struct VoiceLogger {
    log_channel: Option<ChannelId>,
}

impl VoiceLogger {
    pub fn new(log_channel: Option<ChannelId>) -> Self {
        Self { log_channel }
    }

    async fn store(&self, ctx: &Context) -> Arc<dyn CounterStore> {
        let data = ctx.data.read().await;
        data.get::<SharedCounterStore>()
            .expect("counter store missing from client data")
            .clone()
    }
}

#[async_trait]
impl EventHandler for VoiceLogger {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "connected to the gateway");

        for command in commands::registrations() {
            if let Err(e) = Command::create_global_command(&ctx.http, command).await {
                error!(error = %e, "global command registration failed");
            }
        }

        // Guild commands show up immediately, unlike the global rollout.
        for guild_id in ctx.cache.guilds() {
            for command in commands::registrations() {
                if let Err(e) = guild_id.create_command(&ctx.http, command).await {
                    error!(error = %e, guild = %guild_id, "guild command registration failed");
                }
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(event) = VoiceEvent::from_update(old.as_ref(), &new) else {
            return;
        };

        let transition = classify(event.before, event.after);
        if transition == Transition::NoOp {
            debug!(user = %event.user_id, "voice state update without a channel change");
            return;
        }

        let store = self.store(&ctx).await;
        if let Err(e) = record_transition(store.as_ref(), &event, &transition) {
            error!(error = %e, user = %event.user_id, "failed to record voice event");
            return;
        }
        info!(user = %event.user_id, ?transition, "recorded voice event");

        let Some(channel) = self.log_channel else {
            debug!("no log channel configured, announcement skipped");
            return;
        };
        if let Some(notification) = Notification::for_transition(event.user_id, &transition) {
            let message = CreateMessage::new().embed(notification.into_embed());
            if let Err(e) = channel.send_message(&ctx.http, message).await {
                error!(error = %e, channel = %channel, "failed to send announcement");
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(cmd) = interaction else {
            return;
        };

        let store = self.store(&ctx).await;
        match cmd.data.name.as_str() {
            "stats" => commands::handle_stats(&ctx, &cmd, store.as_ref()).await,
            "counter-change" => commands::handle_counter_change(&ctx, &cmd, store.as_ref()).await,
            _ => {}
        }
    }
}
