//! Session settings chosen before play starts.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{BoardError, BoardGraph, layouts};
use crate::player::{MAX_PLAYERS, MIN_PLAYERS, Roster};

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("player count {count} is outside {min}..={max}")]
    PlayerCount { count: usize, min: usize, max: usize },
    #[error("dice need at least 2 sides, got {sides}")]
    DiceSides { sides: u32 },
    #[error("fruit price must be at least 1 crumb")]
    FruitPrice,
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("settings could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_player_count")]
    pub player_count: usize,
    /// Display names by seat; blank or missing seats use "Player N".
    #[serde(default)]
    pub player_names: Vec<String>,
    #[serde(default = "Settings::default_board")]
    pub board: String,
    #[serde(default = "Settings::default_dice_sides")]
    pub dice_sides: u32,
    /// Crumbs one fruit costs at a shop tile.
    #[serde(default = "Settings::default_fruit_price")]
    pub fruit_price: u32,
    /// Force a minigame after a full round of turns that hit no minigame tile.
    #[serde(default = "Settings::default_minigame_every_round")]
    pub minigame_every_round: bool,
}

impl Settings {
    #[must_use]
    pub const fn default_player_count() -> usize {
        4
    }

    #[must_use]
    pub fn default_board() -> String {
        "meadow".to_string()
    }

    #[must_use]
    pub const fn default_dice_sides() -> u32 {
        6
    }

    #[must_use]
    pub const fn default_fruit_price() -> u32 {
        5
    }

    #[must_use]
    pub const fn default_minigame_every_round() -> bool {
        true
    }

    /// Parse and validate settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed JSON and any
    /// validation error from [`Settings::validate`].
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|err| SettingsError::Parse(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(SettingsError::PlayerCount {
                count: self.player_count,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }
        if self.dice_sides < 2 {
            return Err(SettingsError::DiceSides {
                sides: self.dice_sides,
            });
        }
        if self.fruit_price == 0 {
            return Err(SettingsError::FruitPrice);
        }
        layouts::builtin_spec(&self.board)?;
        Ok(())
    }

    #[must_use]
    pub fn roster(&self) -> Roster {
        Roster::with_names(self.player_count, &self.player_names)
    }

    /// Build the configured board.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown or malformed boards.
    pub fn build_board(&self) -> Result<BoardGraph, SettingsError> {
        Ok(layouts::builtin(&self.board)?)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_count: Self::default_player_count(),
            player_names: Vec::new(),
            board: Self::default_board(),
            dice_sides: Self::default_dice_sides(),
            fruit_price: Self::default_fruit_price(),
            minigame_every_round: Self::default_minigame_every_round(),
        }
    }
}
