//! voicelog tracks voice channel activity on a Discord server: every join,
//! leave and move is announced in a text channel and counted per user in a
//! JSON file, queryable through the `/stats` and `/counter-change` slash
//! commands.
//!
//! - [`config`]: environment-resolved startup configuration
//! - [`store`]: the counter document and its file-backed store
//! - [`classify`]: before/after channel comparison
//! - [`notify`]: announcement embeds
//! - [`commands`]: the slash command surface
//! - [`handler`]: serenity event handler tying it together

pub mod classify;
pub mod commands;
pub mod config;
pub mod handler;
pub mod notify;
pub mod store;
