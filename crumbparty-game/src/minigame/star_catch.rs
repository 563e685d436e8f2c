//! Catching stars: each player chases their own falling star for a fixed time.
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::any::Any;

use super::{ConfigError, MiniGame, MinigameKind, RoundBook, require_positive};
use crate::input::InputSource;
use crate::numbers::usize_to_f32;
use crate::player::{PlayerId, Roster};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarCatchConfig {
    #[serde(default = "StarCatchConfig::default_width")]
    pub width: f32,
    #[serde(default = "StarCatchConfig::default_height")]
    pub height: f32,
    /// Seconds of play before the round is scored.
    #[serde(default = "StarCatchConfig::default_duration")]
    pub duration: f32,
    #[serde(default = "StarCatchConfig::default_catcher_speed")]
    pub catcher_speed: f32,
    /// Half width of a catcher.
    #[serde(default = "StarCatchConfig::default_catcher_reach")]
    pub catcher_reach: f32,
    #[serde(default = "StarCatchConfig::default_star_radius")]
    pub star_radius: f32,
    #[serde(default = "StarCatchConfig::default_min_fall_speed")]
    pub min_fall_speed: f32,
    #[serde(default = "StarCatchConfig::default_max_fall_speed")]
    pub max_fall_speed: f32,
}

impl StarCatchConfig {
    #[must_use]
    pub const fn default_width() -> f32 {
        16.0
    }

    #[must_use]
    pub const fn default_height() -> f32 {
        9.0
    }

    #[must_use]
    pub const fn default_duration() -> f32 {
        30.0
    }

    #[must_use]
    pub const fn default_catcher_speed() -> f32 {
        8.0
    }

    #[must_use]
    pub const fn default_catcher_reach() -> f32 {
        0.8
    }

    #[must_use]
    pub const fn default_star_radius() -> f32 {
        0.3
    }

    #[must_use]
    pub const fn default_min_fall_speed() -> f32 {
        3.0
    }

    #[must_use]
    pub const fn default_max_fall_speed() -> f32 {
        6.0
    }

    /// Height of the line catchers ride on.
    #[must_use]
    pub fn catcher_line(&self) -> f32 {
        self.height - 0.5
    }

    /// # Errors
    ///
    /// Returns an error when stars could not be dropped or catchers could not move.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("width", self.width)?;
        require_positive("height", self.height)?;
        require_positive("duration", self.duration)?;
        require_positive("catcher_speed", self.catcher_speed)?;
        require_positive("catcher_reach", self.catcher_reach)?;
        require_positive("star_radius", self.star_radius)?;
        require_positive("min_fall_speed", self.min_fall_speed)?;
        if self.min_fall_speed > self.max_fall_speed {
            return Err(ConfigError::FallSpeedRange {
                min: self.min_fall_speed,
                max: self.max_fall_speed,
            });
        }
        let reach = self.catcher_reach.max(self.star_radius);
        if self.width <= 2.0 * reach {
            return Err(ConfigError::FieldTooNarrow {
                width: self.width,
                reach,
            });
        }
        Ok(())
    }
}

impl Default for StarCatchConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            duration: Self::default_duration(),
            catcher_speed: Self::default_catcher_speed(),
            catcher_reach: Self::default_catcher_reach(),
            star_radius: Self::default_star_radius(),
            min_fall_speed: Self::default_min_fall_speed(),
            max_fall_speed: Self::default_max_fall_speed(),
        }
    }
}

/// A player's catcher and the star only they can catch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarLane {
    pub player: PlayerId,
    pub catcher_x: f32,
    pub star_x: f32,
    pub star_y: f32,
    pub fall_speed: f32,
    pub caught: u32,
    pub missed: u32,
}

#[derive(Debug, Clone)]
pub struct StarCatch {
    config: StarCatchConfig,
    book: RoundBook,
    lanes: Vec<StarLane>,
    remaining: f32,
}

impl StarCatch {
    #[must_use]
    pub fn new(roster: &Roster) -> Self {
        Self::build(roster, StarCatchConfig::default())
    }

    /// # Errors
    ///
    /// Returns an error when the tuning fails [`StarCatchConfig::validate`].
    pub fn with_config(roster: &Roster, config: StarCatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(roster, config))
    }

    fn build(roster: &Roster, config: StarCatchConfig) -> Self {
        let ids = roster.ids();
        let lanes = ids
            .iter()
            .map(|&player| StarLane {
                player,
                catcher_x: 0.0,
                star_x: 0.0,
                star_y: 0.0,
                fall_speed: config.min_fall_speed,
                caught: 0,
                missed: 0,
            })
            .collect();
        Self {
            config,
            book: RoundBook::new(ids),
            lanes,
            remaining: config.duration,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StarCatchConfig {
        &self.config
    }

    /// Seconds left on the clock.
    #[must_use]
    pub const fn time_remaining(&self) -> f32 {
        self.remaining
    }

    #[must_use]
    pub fn lane(&self, player: PlayerId) -> Option<&StarLane> {
        self.lanes.iter().find(|lane| lane.player == player)
    }

    #[must_use]
    pub fn score(&self, player: PlayerId) -> Option<u32> {
        self.lane(player).map(|lane| lane.caught)
    }

    fn drop_star(config: &StarCatchConfig, lane: &mut StarLane, rng: &mut dyn RngCore) {
        let r = config.star_radius;
        lane.star_x = rng.gen_range(r..=config.width - r);
        lane.star_y = -r;
        lane.fall_speed = rng.gen_range(config.min_fall_speed..=config.max_fall_speed);
    }
}

impl MiniGame for StarCatch {
    fn kind(&self) -> MinigameKind {
        MinigameKind::StarCatch
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
        let count = usize_to_f32(self.lanes.len());
        for (slot, lane) in self.lanes.iter_mut().enumerate() {
            lane.catcher_x = self.config.width * (usize_to_f32(slot) + 1.0) / (count + 1.0);
            lane.caught = 0;
            lane.missed = 0;
            Self::drop_star(&self.config, lane, rng);
        }
        self.remaining = self.config.duration;
        self.book.begin();
    }

    fn update(&mut self, dt: f32, input: &dyn InputSource, rng: &mut dyn RngCore) {
        if !self.book.is_active() {
            return;
        }
        let cfg = self.config;
        let line = cfg.catcher_line();
        for lane in &mut self.lanes {
            let (ax, _) = input.axis(lane.player);
            lane.catcher_x = (lane.catcher_x + ax * cfg.catcher_speed * dt)
                .clamp(cfg.catcher_reach, cfg.width - cfg.catcher_reach);

            let before = lane.star_y;
            lane.star_y += lane.fall_speed * dt;
            let crossed = before < line && lane.star_y >= line;
            let gap = (lane.star_x - lane.catcher_x).abs();
            let within = gap <= cfg.catcher_reach + cfg.star_radius;
            if crossed && within {
                lane.caught += 1;
                log::debug!("star-catch: {} caught star {}", lane.player, lane.caught);
                Self::drop_star(&cfg, lane, rng);
            } else if lane.star_y - cfg.star_radius > cfg.height {
                lane.missed += 1;
                Self::drop_star(&cfg, lane, rng);
            }
        }

        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            let scores: Vec<u32> = self.lanes.iter().map(|lane| lane.caught).collect();
            self.book.place_by_score(&scores);
            self.book.complete();
        }
    }

    fn score_value(&self, player: PlayerId) -> Option<u32> {
        self.score(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Button, InputState, NoInput};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn pid(n: u8) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    fn started(players: usize) -> (StarCatch, ChaCha20Rng) {
        let roster = Roster::new(players);
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let mut game = StarCatch::new(&roster);
        game.setup(&mut rng);
        (game, rng)
    }

    #[test]
    fn stars_drop_from_the_top_within_speed_range() {
        let (game, _) = started(4);
        let cfg = game.config();
        for id in [pid(1), pid(2), pid(3), pid(4)] {
            let lane = game.lane(id).unwrap();
            assert!(lane.star_y < 0.0);
            assert!((cfg.min_fall_speed..=cfg.max_fall_speed).contains(&lane.fall_speed));
            assert!((0.0..=cfg.width).contains(&lane.star_x));
        }
    }

    #[test]
    fn a_star_over_the_catcher_is_caught() {
        let (mut game, mut rng) = started(2);
        let line = game.config().catcher_line();
        let lane = &mut game.lanes[0];
        lane.star_x = lane.catcher_x;
        lane.star_y = line - 0.01;
        game.update(0.05, &NoInput, &mut rng);
        assert_eq!(game.score(pid(1)), Some(1));
        assert!(game.lane(pid(1)).unwrap().star_y < 0.0, "respawned at the top");
    }

    #[test]
    fn a_star_past_the_bottom_is_missed_without_penalty() {
        let (mut game, mut rng) = started(2);
        let cfg = *game.config();
        let lane = &mut game.lanes[1];
        lane.star_x = if lane.catcher_x > cfg.width / 2.0 { 0.5 } else { cfg.width - 0.5 };
        lane.star_y = cfg.height + cfg.star_radius - 0.01;
        game.update(0.05, &NoInput, &mut rng);
        let lane = game.lane(pid(2)).unwrap();
        assert_eq!(lane.caught, 0);
        assert_eq!(lane.missed, 1);
        assert!(lane.star_y < 0.0);
    }

    #[test]
    fn catchers_follow_the_axis_and_stay_in_the_field() {
        let (mut game, mut rng) = started(2);
        let mut input = InputState::new();
        input.press(pid(2), Button::Right);
        for _ in 0..60 {
            game.update(0.05, &input, &mut rng);
        }
        let cfg = game.config();
        let x = game.lane(pid(2)).unwrap().catcher_x;
        assert!((x - (cfg.width - cfg.catcher_reach)).abs() < 1e-4);
    }

    #[test]
    fn ends_after_the_duration_with_stable_ties() {
        let (mut game, mut rng) = started(3);
        let mut frames = 0;
        while !game.is_complete() && frames < 10_000 {
            for lane in &mut game.lanes {
                lane.star_y = -1.0;
                lane.fall_speed = 0.0;
            }
            game.lanes[2].caught = 4;
            game.update(0.1, &NoInput, &mut rng);
            frames += 1;
        }
        assert!(game.is_complete());
        assert!(frames >= 299 && frames <= 301, "{frames}");
        assert_eq!(game.placements(), &[Some(pid(3)), Some(pid(1)), Some(pid(2))]);
        assert_eq!(game.score_value(pid(3)), Some(4));
        assert_eq!(game.score_value(pid(1)), Some(0));
    }

    #[test]
    fn tuning_that_cannot_drop_stars_is_rejected() {
        let roster = Roster::new(2);
        let inverted = StarCatchConfig {
            min_fall_speed: 7.0,
            max_fall_speed: 2.0,
            ..StarCatchConfig::default()
        };
        assert_eq!(
            StarCatch::with_config(&roster, inverted).unwrap_err(),
            ConfigError::FallSpeedRange { min: 7.0, max: 2.0 }
        );
        let narrow = StarCatchConfig {
            width: 1.0,
            ..StarCatchConfig::default()
        };
        assert!(matches!(
            StarCatch::with_config(&roster, narrow),
            Err(ConfigError::FieldTooNarrow { .. })
        ));
        let frozen = StarCatchConfig {
            catcher_speed: -1.0,
            ..StarCatchConfig::default()
        };
        assert!(StarCatch::with_config(&roster, frozen).is_err());
        assert!(StarCatch::with_config(&roster, StarCatchConfig::default()).is_ok());
    }
}
