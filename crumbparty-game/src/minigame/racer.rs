//! Reaction racer: tap to advance, placements in arrival order.
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::any::Any;

use super::{ConfigError, MiniGame, MinigameKind, RoundBook, require_positive};
use crate::input::{Button, InputSource};
use crate::numbers::secs_to_millis;
use crate::player::{PlayerId, Roster};

/// Track tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RacerConfig {
    /// Units gained per second of frame time on each tap.
    #[serde(default = "RacerConfig::default_speed")]
    pub speed: f32,
    #[serde(default = "RacerConfig::default_finish_line")]
    pub finish_line: f32,
    #[serde(default)]
    pub start_x: f32,
}

impl RacerConfig {
    #[must_use]
    pub const fn default_speed() -> f32 {
        20.0
    }

    #[must_use]
    pub const fn default_finish_line() -> f32 {
        14.0
    }

    /// # Errors
    ///
    /// Returns an error when taps cannot move a racer past the finish line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("speed", self.speed)?;
        require_positive("finish_line", self.finish_line - self.start_x)
    }
}

impl Default for RacerConfig {
    fn default() -> Self {
        Self {
            speed: Self::default_speed(),
            finish_line: Self::default_finish_line(),
            start_x: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Lane {
    id: PlayerId,
    x: f32,
    finish_time: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct Racer {
    config: RacerConfig,
    book: RoundBook,
    lanes: Vec<Lane>,
    elapsed: f32,
}

impl Racer {
    #[must_use]
    pub fn new(roster: &Roster) -> Self {
        Self::build(roster, RacerConfig::default())
    }

    /// # Errors
    ///
    /// Returns an error when the tuning fails [`RacerConfig::validate`].
    pub fn with_config(roster: &Roster, config: RacerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(roster, config))
    }

    fn build(roster: &Roster, config: RacerConfig) -> Self {
        let ids = roster.ids();
        let lanes = ids
            .iter()
            .map(|&id| Lane {
                id,
                x: config.start_x,
                finish_time: None,
            })
            .collect();
        Self {
            config,
            book: RoundBook::new(ids),
            lanes,
            elapsed: 0.0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RacerConfig {
        &self.config
    }

    /// Distance covered along the lane.
    #[must_use]
    pub fn position(&self, player: PlayerId) -> Option<f32> {
        self.lane(player).map(|lane| lane.x)
    }

    /// Seconds from the start until the player crossed the line.
    #[must_use]
    pub fn finish_time(&self, player: PlayerId) -> Option<f32> {
        self.lane(player).and_then(|lane| lane.finish_time)
    }

    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn lane(&self, player: PlayerId) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.id == player)
    }
}

impl MiniGame for Racer {
    fn kind(&self) -> MinigameKind {
        MinigameKind::Racer
    }

    fn book(&self) -> &RoundBook {
        &self.book
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn setup(&mut self, _rng: &mut dyn RngCore) {
        if self.book.is_complete() {
            return;
        }
        for lane in &mut self.lanes {
            lane.x = self.config.start_x;
            lane.finish_time = None;
        }
        self.elapsed = 0.0;
        self.book.begin();
    }

    fn update(&mut self, dt: f32, input: &dyn InputSource, _rng: &mut dyn RngCore) {
        if !self.book.is_active() {
            return;
        }
        self.elapsed += dt;
        for lane in &mut self.lanes {
            if lane.finish_time.is_some() {
                continue;
            }
            if input.just_pressed(lane.id, Button::Action) {
                lane.x += self.config.speed * dt;
            }
            if lane.x >= self.config.finish_line {
                lane.finish_time = Some(self.elapsed);
                if let Some(rank) = self.book.finish_next(lane.id) {
                    log::debug!(
                        "racer: {} crossed in place {} after {} ms",
                        lane.id,
                        rank + 1,
                        secs_to_millis(self.elapsed)
                    );
                }
            }
        }
        if self.book.remaining() == 0 {
            self.book.complete();
        }
    }
}
