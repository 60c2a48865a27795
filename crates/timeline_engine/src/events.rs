// SPDX-License-Identifier: MIT OR Apache-2.0
//! Channels the engine emits on and their payloads.

use std::fmt;
use std::str::FromStr;

/// Event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Before a manual time change; cancelable
    BeforeSetTime,
    /// After a manual time change
    AfterSetTime,
    /// After a time change made by a playback tick
    SetTimeByTick,
    /// Before a play rate change; cancelable
    BeforeSetPlayRate,
    /// After a play rate change
    AfterSetPlayRate,
    /// Playback started
    Play,
    /// Playback paused
    Paused,
    /// Playback reached its end
    Ended,
}

impl EventKind {
    /// Every channel, in catalog order
    pub const ALL: [EventKind; 8] = [
        EventKind::BeforeSetTime,
        EventKind::AfterSetTime,
        EventKind::SetTimeByTick,
        EventKind::BeforeSetPlayRate,
        EventKind::AfterSetPlayRate,
        EventKind::Play,
        EventKind::Paused,
        EventKind::Ended,
    ];

    /// Channel name
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeSetTime => "beforeSetTime",
            Self::AfterSetTime => "afterSetTime",
            Self::SetTimeByTick => "setTimeByTick",
            Self::BeforeSetPlayRate => "beforeSetPlayRate",
            Self::AfterSetPlayRate => "afterSetPlayRate",
            Self::Play => "play",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    /// Whether a listener can veto the change this channel announces
    pub fn is_cancelable(&self) -> bool {
        matches!(self, Self::BeforeSetTime | Self::BeforeSetPlayRate)
    }

    /// Whether `payload` has the shape this channel carries
    pub fn accepts(&self, payload: &EventPayload) -> bool {
        match self {
            Self::BeforeSetTime | Self::AfterSetTime | Self::SetTimeByTick => {
                matches!(payload, EventPayload::Time { .. })
            }
            Self::BeforeSetPlayRate | Self::AfterSetPlayRate => {
                matches!(payload, EventPayload::Rate { .. })
            }
            Self::Play | Self::Paused | Self::Ended => matches!(payload, EventPayload::State),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown channel name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event channel: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownEvent(s.to_owned()))
    }
}

/// Value carried by an event. The engine itself is handed to listeners
/// separately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventPayload {
    /// A time, in seconds
    Time {
        /// The time being set
        time: f64,
    },
    /// A play rate
    Rate {
        /// The rate being set
        rate: f64,
    },
    /// Playback state change; no value
    State,
}

impl EventPayload {
    /// Time carried by the payload, if any
    pub fn time(&self) -> Option<f64> {
        match self {
            Self::Time { time } => Some(*time),
            _ => None,
        }
    }

    /// Rate carried by the payload, if any
    pub fn rate(&self) -> Option<f64> {
        match self {
            Self::Rate { rate } => Some(*rate),
            _ => None,
        }
    }
}
