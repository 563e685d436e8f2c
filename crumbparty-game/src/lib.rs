//! Crumb Party Game Engine
//!
//! Platform-agnostic core of a local multiplayer party game: the board graph
//! players move across, the shared minigame lifecycle with placement and
//! crumb scoring, the four minigame rule engines and the minigame rush.
//! Rendering, input mapping and file I/O belong to the embedding platform.

pub mod board;
pub mod events;
pub mod input;
pub mod leaderboard;
pub mod minigame;
pub mod numbers;
pub mod player;
pub mod rush;
pub mod screen;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use board::{
    BoardError, BoardGraph, BoardPosition, BoardSpec, BoardTile, DirectionalChoice,
    FirstCandidate, JunctionChooser, MoveOutcome, RandomChoice, TileColor, TileType,
};
pub use events::{RecordingSink, SessionEvent, SessionSink};
pub use input::{Button, Direction, InputSource, InputState, NoInput};
pub use leaderboard::{Leaderboard, LeaderboardEntry, ScoreOrder, ScoreRecord};
pub use minigame::{
    ConfigError, MiniGame, MinigameKind, MinigameOutcome, MinigameRun, Phase, RoundBook,
    crumb_awards,
};
pub use player::{MAX_PLAYERS, MIN_PLAYERS, Player, PlayerId, Roster};
pub use rush::{MinigameDescriptor, RushController, catalog, final_standings, winners};
pub use screen::Screen;
pub use session::{BoardSession, TurnOutcome};
pub use settings::{Settings, SettingsError};

use anyhow::Context;

/// Trait for abstracting settings and leaderboard persistence
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load saved settings, `None` when nothing was saved yet
    ///
    /// # Errors
    ///
    /// Returns an error if stored settings exist but cannot be read.
    fn load_settings(&self) -> Result<Option<Settings>, Self::Error>;

    /// Save settings
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    fn save_settings(&self, settings: &Settings) -> Result<(), Self::Error>;

    /// Load the leaderboard, `None` when nothing was saved yet
    ///
    /// # Errors
    ///
    /// Returns an error if a stored leaderboard exists but cannot be read.
    fn load_leaderboard(&self) -> Result<Option<Leaderboard>, Self::Error>;

    /// Save the leaderboard
    ///
    /// # Errors
    ///
    /// Returns an error if the leaderboard cannot be saved.
    fn save_leaderboard(&self, leaderboard: &Leaderboard) -> Result<(), Self::Error>;
}

/// Entry point tying persisted settings and scores to new sessions
pub struct GameEngine<S>
where
    S: GameStorage,
{
    storage: S,
}

impl<S> GameEngine<S>
where
    S: GameStorage,
{
    /// Create a new game engine with the provided storage
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Saved settings, or the defaults when none were saved
    ///
    /// # Errors
    ///
    /// Returns an error if stored settings cannot be loaded or are invalid.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings = self
            .storage
            .load_settings()
            .context("loading settings")?
            .unwrap_or_default();
        settings.validate().context("validating stored settings")?;
        Ok(settings)
    }

    /// Validate and persist settings
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be saved.
    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        settings.validate().context("validating settings")?;
        self.storage
            .save_settings(settings)
            .context("saving settings")
    }

    /// Start a board session from the saved settings; seeded sessions are
    /// reproducible
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be loaded or the board built.
    pub fn new_session(&self, seed: Option<u64>) -> anyhow::Result<BoardSession> {
        let settings = self.settings()?;
        let session = match seed {
            Some(seed) => BoardSession::with_seed(settings, seed),
            None => BoardSession::new(settings),
        };
        session.context("starting board session")
    }

    /// Submit score records to the stored leaderboard; returns the rank each
    /// record reached, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the leaderboard cannot be loaded or saved.
    pub fn record_scores(&self, records: &[ScoreRecord]) -> anyhow::Result<Vec<Option<usize>>> {
        let mut leaderboard = self
            .storage
            .load_leaderboard()
            .context("loading leaderboard")?
            .unwrap_or_default();
        let ranks = records.iter().map(|r| leaderboard.submit(r)).collect();
        self.storage
            .save_leaderboard(&leaderboard)
            .context("saving leaderboard")?;
        Ok(ranks)
    }

    /// The stored leaderboard, empty when none was saved
    ///
    /// # Errors
    ///
    /// Returns an error if the leaderboard cannot be loaded.
    pub fn leaderboard(&self) -> anyhow::Result<Leaderboard> {
        Ok(self
            .storage
            .load_leaderboard()
            .context("loading leaderboard")?
            .unwrap_or_default())
    }
}
