//! Session events and the sink that receives them.
//!
//! The core emits events, score records and screen requests; whether they
//! are persisted or shown is the platform's business.
use serde::{Deserialize, Serialize};

use crate::leaderboard::ScoreRecord;
use crate::screen::Screen;

/// Discrete record of something that happened during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    MinigameStart {
        minigame: String,
        players: Vec<String>,
    },
    MinigameEnd {
        minigame: String,
        /// Player names best-first; missing entries read "Unknown".
        placements: Vec<String>,
        /// Crumbs awarded, aligned with `placements`.
        crumbs: Vec<u32>,
    },
    PlayerTurn {
        player: String,
        roll: u32,
        from: usize,
        to: usize,
    },
}

impl SessionEvent {
    /// Stable snake_case name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MinigameStart { .. } => "minigame_start",
            Self::MinigameEnd { .. } => "minigame_end",
            Self::PlayerTurn { .. } => "player_turn",
        }
    }
}

/// Receiver for everything the core reports outward.
pub trait SessionSink {
    /// Ask the navigation layer to present a screen.
    fn set_screen(&mut self, screen: Screen);

    /// Append a session event.
    fn record_event(&mut self, event: SessionEvent);

    /// Offer a score to the leaderboard.
    fn record_score(&mut self, record: ScoreRecord);
}

/// Sink that keeps everything in memory, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSink {
    pub screens: Vec<Screen>,
    pub events: Vec<SessionEvent>,
    pub scores: Vec<ScoreRecord>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent screen request.
    #[must_use]
    pub fn last_screen(&self) -> Option<&Screen> {
        self.screens.last()
    }

    /// Events of one kind, in order.
    pub fn events_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a SessionEvent> + 'a {
        self.events.iter().filter(move |e| e.kind() == kind)
    }
}

impl SessionSink for RecordingSink {
    fn set_screen(&mut self, screen: Screen) {
        self.screens.push(screen);
    }

    fn record_event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    fn record_score(&mut self, record: ScoreRecord) {
        self.scores.push(record);
    }
}
