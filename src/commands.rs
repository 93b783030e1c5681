//! The `/stats` and `/counter-change` slash commands.
//!
//! Option extraction and the response paths live here; the counter logic
//! itself goes through [`CounterStore`] so it can be exercised without a
//! gateway connection.

use serenity::all::CommandDataOptionValue;
use serenity::all::CommandInteraction;
use serenity::all::CommandOptionType;
use serenity::all::CreateCommand;
use serenity::all::CreateCommandOption;
use serenity::all::CreateEmbed;
use serenity::all::CreateInteractionResponse;
use serenity::all::CreateInteractionResponseMessage;
use serenity::prelude::Context;
use thiserror::Error;
use tracing::error;

use crate::store::{Counter, CounterDocument, CounterStore, StoreError, Tally};

/// Selector that makes `/stats` sum over every tracked user.
const GLOBAL_SELECTOR: &str = "global";

const STORAGE_UNAVAILABLE: &str = "Counter storage is unavailable.";

/// Failures surfaced by the manual counter edit.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The target has never been seen by the event pipeline. The edit
    /// command never creates records.
    #[error("user {0} is not tracked")]
    UnknownUser(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Definitions for every command the bot registers.
pub fn registrations() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("stats")
            .description("Show voice channel stats")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "user",
                    "User ID or 'global'",
                )
                .required(false),
            ),
        CreateCommand::new("counter-change")
            .description("Modify voice counters")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "user", "User ID")
                    .required(true),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "counter", "Counter type")
                    .required(true)
                    .add_string_choice("joins", "joins")
                    .add_string_choice("leaves", "leaves")
                    .add_string_choice("moves", "moves"),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::Integer, "value", "New value")
                    .required(true),
            ),
    ]
}

/// Resolve a `/stats` selector against a loaded document. `"global"` sums
/// every record; anything else reads one user, zero-filled when untracked.
pub fn stats_tally(doc: &CounterDocument, selector: &str) -> Tally {
    if selector == GLOBAL_SELECTOR {
        doc.tally_global()
    } else {
        doc.tally_user(selector)
    }
}

/// The `/stats` reply body, one line per counter.
pub fn format_tally(tally: &Tally) -> String {
    format!(
        "🟢 Joins: {}\n🔴 Leaves: {}\n🟠 Moves: {}",
        tally.joins, tally.leaves, tally.moves
    )
}

/// Apply `/counter-change`: overwrite one counter of an already-tracked user
/// and persist the document. Untracked users are rejected before any write.
pub fn apply_counter_change(
    store: &dyn CounterStore,
    user_id: &str,
    counter: Counter,
    value: i64,
) -> Result<(), CommandError> {
    let mut doc = store.load()?;
    if !doc.set_counter(user_id, counter, value) {
        return Err(CommandError::UnknownUser(user_id.to_owned()));
    }
    store.save(&doc)?;
    Ok(())
}

pub async fn handle_stats(ctx: &Context, cmd: &CommandInteraction, store: &dyn CounterStore) {
    let selector = str_option(cmd, "user").unwrap_or(GLOBAL_SELECTOR);

    let message = match store.load() {
        Ok(doc) => {
            let embed = CreateEmbed::new()
                .title("Voice Channel Stats")
                .description(format_tally(&stats_tally(&doc, selector)));
            CreateInteractionResponseMessage::new().embed(embed)
        }
        Err(e) => {
            error!(error = %e, "failed to load counters for /stats");
            CreateInteractionResponseMessage::new()
                .content(STORAGE_UNAVAILABLE)
                .ephemeral(true)
        }
    };

    respond(ctx, cmd, message).await;
}

pub async fn handle_counter_change(
    ctx: &Context,
    cmd: &CommandInteraction,
    store: &dyn CounterStore,
) {
    let user = str_option(cmd, "user");
    let counter = str_option(cmd, "counter").and_then(Counter::parse);
    let value = int_option(cmd, "value");

    // All three options are registered as required; a hole here means the
    // payload did not match the registration.
    let (Some(user), Some(counter), Some(value)) = (user, counter, value) else {
        let message = CreateInteractionResponseMessage::new()
            .content("Missing or invalid options.")
            .ephemeral(true);
        respond(ctx, cmd, message).await;
        return;
    };

    let message = match apply_counter_change(store, user, counter, value) {
        Ok(()) => CreateInteractionResponseMessage::new()
            .content(format!("{counter} for user {user} set to {value}.")),
        Err(CommandError::UnknownUser(_)) => CreateInteractionResponseMessage::new()
            .content(format!("User {user} not tracked."))
            .ephemeral(true),
        Err(CommandError::Store(e)) => {
            error!(error = %e, "failed to persist counter change");
            CreateInteractionResponseMessage::new()
                .content(STORAGE_UNAVAILABLE)
                .ephemeral(true)
        }
    };

    respond(ctx, cmd, message).await;
}

fn str_option<'a>(cmd: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    cmd.data
        .options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| match &o.value {
            CommandDataOptionValue::String(s) => Some(s.as_str()),
            _ => None,
        })
}

fn int_option(cmd: &CommandInteraction, name: &str) -> Option<i64> {
    cmd.data
        .options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| match o.value {
            CommandDataOptionValue::Integer(i) => Some(i),
            _ => None,
        })
}

async fn respond(
    ctx: &Context,
    cmd: &CommandInteraction,
    message: CreateInteractionResponseMessage,
) {
    if let Err(e) = cmd
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        error!(error = %e, command = %cmd.data.name, "failed to respond to interaction");
    }
}
