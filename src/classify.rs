//! Classification of a voice-state change into join, leave or move.

use serenity::model::id::ChannelId;

use crate::store::Counter;

/// Outcome of comparing channel membership before and after a voice state
/// update. Exactly one case applies to any before/after pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Not in a channel before, in one now.
    Joined(ChannelId),
    /// In a channel before, in none now.
    Left(ChannelId),
    /// Switched between two different channels.
    Moved { from: ChannelId, to: ChannelId },
    /// No channel change: absent on both sides, or the same channel on both.
    /// Mute and deafen toggles land here.
    NoOp,
}

impl Transition {
    /// The counter this transition bumps, `None` for no-ops.
    pub fn counter(&self) -> Option<Counter> {
        match self {
            Transition::Joined(_) => Some(Counter::Joins),
            Transition::Left(_) => Some(Counter::Leaves),
            Transition::Moved { .. } => Some(Counter::Moves),
            Transition::NoOp => None,
        }
    }
}

/// Classify a before/after channel pair.
pub fn classify(before: Option<ChannelId>, after: Option<ChannelId>) -> Transition {
    match (before, after) {
        (None, Some(to)) => Transition::Joined(to),
        (Some(from), None) => Transition::Left(from),
        (Some(from), Some(to)) if from != to => Transition::Moved { from, to },
        _ => Transition::NoOp,
    }
}
