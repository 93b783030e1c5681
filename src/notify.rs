//! Announcement embeds for classified voice events.

use serenity::all::{Colour, CreateEmbed, Timestamp, UserId};

use crate::classify::Transition;

const JOINED_COLOUR: Colour = Colour(0x2ECC71);
const LEFT_COLOUR: Colour = Colour(0xE74C3C);
const MOVED_COLOUR: Colour = Colour(0xE67E22);

/// A fully formatted announcement. Building one has no side effects; sending
/// it to a channel is the caller's business.
#[derive(Debug, Clone)]
pub struct Notification {
    pub colour: Colour,
    pub description: String,
    pub timestamp: Timestamp,
}

impl Notification {
    /// Build the announcement for a classified event, stamped with the time
    /// of processing. No-ops produce nothing.
    pub fn for_transition(user: UserId, transition: &Transition) -> Option<Self> {
        let (colour, description) = match transition {
            Transition::Joined(channel) => {
                (JOINED_COLOUR, format!("<@{user}> has joined <#{channel}>"))
            }
            Transition::Left(channel) => {
                (LEFT_COLOUR, format!("<@{user}> has left <#{channel}>"))
            }
            Transition::Moved { from, to } => (
                MOVED_COLOUR,
                format!("<@{user}> has moved from <#{from}> to <#{to}>"),
            ),
            Transition::NoOp => return None,
        };

        Some(Self {
            colour,
            description,
            timestamp: Timestamp::now(),
        })
    }

    /// Render as the embed the log channel receives.
    pub fn into_embed(self) -> CreateEmbed {
        CreateEmbed::new()
            .description(self.description)
            .colour(self.colour)
            .timestamp(self.timestamp)
    }
}
