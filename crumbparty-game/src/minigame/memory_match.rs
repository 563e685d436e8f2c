//! Memory match: watch a run of arrows, then enter it back.
//!
//! Rounds grow the sequence until it passes the configured maximum; every
//! arrow entered in the right position scores a point.
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::any::Any;

use super::{ConfigError, MiniGame, MinigameKind, RoundBook, require_positive};
use crate::input::{Direction, InputSource};
use crate::numbers::usize_to_f32;
use crate::player::{PlayerId, Roster};

/// Points for an entry: one per position matching the sequence.
#[must_use]
pub fn score_entry(sequence: &[Direction], entry: &[Direction]) -> u32 {
    let matches = sequence
        .iter()
        .zip(entry)
        .filter(|(expected, given)| expected == given)
        .count();
    u32::try_from(matches).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryMatchConfig {
    #[serde(default = "MemoryMatchConfig::default_start_length")]
    pub start_length: usize,
    #[serde(default = "MemoryMatchConfig::default_length_step")]
    pub length_step: usize,
    /// Longest sequence played; the game ends once the next one would be longer.
    #[serde(default = "MemoryMatchConfig::default_max_length")]
    pub max_length: usize,
    /// Seconds the sequence stays visible per symbol.
    #[serde(default = "MemoryMatchConfig::default_show_secs_per_symbol")]
    pub show_secs_per_symbol: f32,
}

impl MemoryMatchConfig {
    #[must_use]
    pub const fn default_start_length() -> usize {
        3
    }

    #[must_use]
    pub const fn default_length_step() -> usize {
        2
    }

    #[must_use]
    pub const fn default_max_length() -> usize {
        7
    }

    #[must_use]
    pub const fn default_show_secs_per_symbol() -> f32 {
        0.75
    }

    /// # Errors
    ///
    /// Returns an error when the sequence would never grow past `max_length`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_length == 0 || self.length_step == 0 {
            return Err(ConfigError::CodeLength {
                start: self.start_length,
                max: self.max_length,
            });
        }
        require_positive("show_secs_per_symbol", self.show_secs_per_symbol)
    }
}

impl Default for MemoryMatchConfig {
    fn default() -> Self {
        Self {
            start_length: Self::default_start_length(),
            length_step: Self::default_length_step(),
            max_length: Self::default_max_length(),
            show_secs_per_symbol: Self::default_show_secs_per_symbol(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Showing { remaining: f32 },
    Input,
}

#[derive(Debug, Clone)]
pub struct MemoryMatch {
    config: MemoryMatchConfig,
    book: RoundBook,
    stage: Stage,
    round: u32,
    code_length: usize,
    sequence: Vec<Direction>,
    entries: Vec<Vec<Direction>>,
    scores: Vec<u32>,
}

impl MemoryMatch {
    #[must_use]
    pub fn new(roster: &Roster) -> Self {
        Self::build(roster, MemoryMatchConfig::default())
    }

    /// # Errors
    ///
    /// Returns an error when the tuning fails [`MemoryMatchConfig::validate`].
    pub fn with_config(roster: &Roster, config: MemoryMatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(roster, config))
    }

    fn build(roster: &Roster, config: MemoryMatchConfig) -> Self {
        let ids = roster.ids();
        let n = ids.len();
        Self {
            config,
            book: RoundBook::new(ids),
            stage: Stage::Input,
            round: 0,
            code_length: config.start_length,
            sequence: Vec::new(),
            entries: vec![Vec::new(); n],
            scores: vec![0; n],
        }
    }

    #[must_use]
    pub const fn config(&self) -> &MemoryMatchConfig {
        &self.config
    }

    /// 1-based round number; zero before setup.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub const fn code_length(&self) -> usize {
        self.code_length
    }

    /// The sequence, while it is on display.
    #[must_use]
    pub fn shown_sequence(&self) -> Option<&[Direction]> {
        match self.stage {
            Stage::Showing { .. } if self.book.is_active() => Some(self.sequence.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_accepting_input(&self) -> bool {
        self.book.is_active() && self.stage == Stage::Input
    }

    /// What the player has entered this round.
    #[must_use]
    pub fn entry(&self, player: PlayerId) -> Option<&[Direction]> {
        let slot = self.book.slot_of(player)?;
        self.entries.get(slot).map(Vec::as_slice)
    }

    #[must_use]
    pub fn score(&self, player: PlayerId) -> Option<u32> {
        let slot = self.book.slot_of(player)?;
        self.scores.get(slot).copied()
    }

    fn start_round(&mut self, rng: &mut dyn RngCore) {
        self.round += 1;
        self.sequence = (0..self.code_length)
            .map(|_| Direction::ALL[rng.gen_range(0..Direction::ALL.len())])
            .collect();
        for entry in &mut self.entries {
            entry.clear();
        }
        self.stage = Stage::Showing {
            remaining: self.config.show_secs_per_symbol * usize_to_f32(self.code_length),
        };
        if log::log_enabled!(log::Level::Debug) {
            let shown: String = self.sequence.iter().copied().map(Direction::symbol).collect();
            log::debug!("memory-match: round {} shows {shown}", self.round);
        }
    }

    fn score_round(&mut self) {
        for (score, entry) in self.scores.iter_mut().zip(&self.entries) {
            *score += score_entry(&self.sequence, entry);
        }
    }
}

impl MiniGame for MemoryMatch {
    fn kind(&self) -> MinigameKind {
        MinigameKind::MemoryMatch
    }

    fn book(&self) -> &RoundBook {
        &self.book
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn setup(&mut self, rng: &mut dyn RngCore) {
        if self.book.is_complete() {
            return;
        }
        self.round = 0;
        self.code_length = self.config.start_length;
        self.scores.fill(0);
        self.book.begin();
        self.start_round(rng);
    }

    fn update(&mut self, dt: f32, input: &dyn InputSource, rng: &mut dyn RngCore) {
        if !self.book.is_active() {
            return;
        }
        if let Stage::Showing { remaining } = self.stage {
            let remaining = remaining - dt;
            self.stage = if remaining <= 0.0 {
                Stage::Input
            } else {
                Stage::Showing { remaining }
            };
            return;
        }

        let length = self.code_length;
        for (slot, &player) in self.book.players().iter().enumerate() {
            let entry = &mut self.entries[slot];
            if entry.len() >= length {
                continue;
            }
            if let Some(direction) = input.just_pressed_direction(player) {
                entry.push(direction);
            }
        }
        if self.entries.iter().any(|entry| entry.len() < length) {
            return;
        }

        self.score_round();
        self.code_length += self.config.length_step;
        if self.code_length > self.config.max_length {
            let scores = self.scores.clone();
            self.book.place_by_score(&scores);
            self.book.complete();
        } else {
            self.start_round(rng);
        }
    }

    fn score_value(&self, player: PlayerId) -> Option<u32> {
        self.score(player)
    }
}
