//! Dodgeball survival: last player untouched by a ball wins.
//!
//! Eliminations fill placements from the back, so the first player out is
//! last and the survivor takes first place.
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::any::Any;

use super::{ConfigError, MiniGame, MinigameKind, RoundBook, require_positive};
use crate::input::{Direction, InputSource};
use crate::numbers::{secs_to_millis, usize_to_f32};
use crate::player::{PlayerId, Roster};

/// Seconds between ball spawns after `elapsed` seconds of play.
#[must_use]
pub fn spawn_interval(elapsed: f32) -> f32 {
    match elapsed {
        t if t < 5.0 => 0.6,
        t if t < 10.0 => 0.5,
        t if t < 15.0 => 0.4,
        t if t < 20.0 => 0.3,
        t if t < 25.0 => 0.2,
        _ => 0.1,
    }
}

/// Court and ball tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DodgeballConfig {
    #[serde(default = "DodgeballConfig::default_width")]
    pub width: f32,
    #[serde(default = "DodgeballConfig::default_height")]
    pub height: f32,
    #[serde(default = "DodgeballConfig::default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "DodgeballConfig::default_player_radius")]
    pub player_radius: f32,
    #[serde(default = "DodgeballConfig::default_ball_speed")]
    pub ball_speed: f32,
    #[serde(default = "DodgeballConfig::default_ball_radius")]
    pub ball_radius: f32,
}

impl DodgeballConfig {
    #[must_use]
    pub const fn default_width() -> f32 {
        16.0
    }

    #[must_use]
    pub const fn default_height() -> f32 {
        9.0
    }

    #[must_use]
    pub const fn default_player_speed() -> f32 {
        5.0
    }

    #[must_use]
    pub const fn default_player_radius() -> f32 {
        0.45
    }

    #[must_use]
    pub const fn default_ball_speed() -> f32 {
        9.0
    }

    #[must_use]
    pub const fn default_ball_radius() -> f32 {
        0.35
    }

    /// # Errors
    ///
    /// Returns an error when a dodger would not fit on the court or balls never cross it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("width", self.width)?;
        require_positive("height", self.height)?;
        require_positive("player_speed", self.player_speed)?;
        require_positive("player_radius", self.player_radius)?;
        require_positive("ball_speed", self.ball_speed)?;
        require_positive("ball_radius", self.ball_radius)?;
        let side = self.width.min(self.height);
        if side <= 2.0 * self.player_radius {
            return Err(ConfigError::FieldTooNarrow {
                width: side,
                reach: self.player_radius,
            });
        }
        Ok(())
    }
}

impl Default for DodgeballConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            player_speed: Self::default_player_speed(),
            player_radius: Self::default_player_radius(),
            ball_speed: Self::default_ball_speed(),
            ball_radius: Self::default_ball_radius(),
        }
    }
}

/// A ball crossing the court in a straight line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub heading: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Dodger {
    id: PlayerId,
    x: f32,
    y: f32,
    out: bool,
    survived: f32,
}

#[derive(Debug, Clone)]
pub struct Dodgeball {
    config: DodgeballConfig,
    book: RoundBook,
    dodgers: Vec<Dodger>,
    projectiles: Vec<Projectile>,
    elapsed: f32,
    spawn_timer: f32,
}

impl Dodgeball {
    #[must_use]
    pub fn new(roster: &Roster) -> Self {
        Self::build(roster, DodgeballConfig::default())
    }

    /// # Errors
    ///
    /// Returns an error when the tuning fails [`DodgeballConfig::validate`].
    pub fn with_config(roster: &Roster, config: DodgeballConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(roster, config))
    }

    fn build(roster: &Roster, config: DodgeballConfig) -> Self {
        let ids = roster.ids();
        let dodgers = ids
            .iter()
            .map(|&id| Dodger {
                id,
                x: 0.0,
                y: 0.0,
                out: false,
                survived: 0.0,
            })
            .collect();
        let mut game = Self {
            config,
            book: RoundBook::new(ids),
            dodgers,
            projectiles: Vec::new(),
            elapsed: 0.0,
            spawn_timer: 0.0,
        };
        game.place_players();
        game
    }

    #[must_use]
    pub const fn config(&self) -> &DodgeballConfig {
        &self.config
    }

    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub fn position(&self, player: PlayerId) -> Option<(f32, f32)> {
        self.dodger(player).map(|d| (d.x, d.y))
    }

    #[must_use]
    pub fn is_out(&self, player: PlayerId) -> bool {
        self.dodger(player).is_some_and(|d| d.out)
    }

    /// Seconds the player lasted; still counting for players in the game.
    #[must_use]
    pub fn survival_time(&self, player: PlayerId) -> Option<f32> {
        self.dodger(player)
            .map(|d| if d.out { d.survived } else { self.elapsed })
    }

    /// Put a ball on the court. Balls normally arrive on the spawn schedule.
    pub fn launch(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    fn dodger(&self, player: PlayerId) -> Option<&Dodger> {
        self.dodgers.iter().find(|d| d.id == player)
    }

    fn place_players(&mut self) {
        let count = usize_to_f32(self.dodgers.len());
        let (w, h) = (self.config.width, self.config.height);
        for (slot, dodger) in self.dodgers.iter_mut().enumerate() {
            dodger.x = w * (usize_to_f32(slot) + 1.0) / (count + 1.0);
            dodger.y = h / 2.0;
            dodger.out = false;
            dodger.survived = 0.0;
        }
    }

    fn spawn(&mut self, rng: &mut dyn RngCore) {
        let heading = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        let (w, h) = (self.config.width, self.config.height);
        let projectile = match heading {
            Direction::Right => Projectile {
                x: 0.0,
                y: rng.gen_range(0.0..=h),
                heading,
            },
            Direction::Left => Projectile {
                x: w,
                y: rng.gen_range(0.0..=h),
                heading,
            },
            Direction::Down => Projectile {
                x: rng.gen_range(0.0..=w),
                y: 0.0,
                heading,
            },
            Direction::Up => Projectile {
                x: rng.gen_range(0.0..=w),
                y: h,
                heading,
            },
        };
        self.projectiles.push(projectile);
    }

    fn move_players(&mut self, dt: f32, input: &dyn InputSource) {
        let cfg = self.config;
        let r = cfg.player_radius;
        for dodger in self.dodgers.iter_mut().filter(|d| !d.out) {
            let (ax, ay) = input.axis(dodger.id);
            dodger.x = (dodger.x + ax * cfg.player_speed * dt).clamp(r, cfg.width - r);
            dodger.y = (dodger.y + ay * cfg.player_speed * dt).clamp(r, cfg.height - r);
        }
    }

    fn move_projectiles(&mut self, dt: f32) {
        let cfg = self.config;
        let margin = cfg.ball_radius;
        for ball in &mut self.projectiles {
            let (dx, dy) = ball.heading.vector();
            ball.x += dx * cfg.ball_speed * dt;
            ball.y += dy * cfg.ball_speed * dt;
        }
        self.projectiles.retain(|b| {
            (-margin..=cfg.width + margin).contains(&b.x)
                && (-margin..=cfg.height + margin).contains(&b.y)
        });
    }

    /// Knock out players touching a ball, consuming that ball. Stops as soon
    /// as a single player is left standing.
    fn resolve_hits(&mut self) {
        let reach = self.config.player_radius + self.config.ball_radius;
        for slot in 0..self.dodgers.len() {
            if self.book.remaining() <= 1 {
                break;
            }
            let dodger = self.dodgers[slot];
            if dodger.out {
                continue;
            }
            let hit = self
                .projectiles
                .iter()
                .position(|b| (b.x - dodger.x).hypot(b.y - dodger.y) < reach);
            let Some(index) = hit else {
                continue;
            };
            self.projectiles.remove(index);
            self.dodgers[slot].out = true;
            self.dodgers[slot].survived = self.elapsed;
            if let Some(rank) = self.book.finish_from_back(dodger.id) {
                log::debug!(
                    "dodgeball: {} out in place {} after {} ms",
                    dodger.id,
                    rank + 1,
                    secs_to_millis(self.elapsed)
                );
            }
        }
    }
}

impl MiniGame for Dodgeball {
    fn kind(&self) -> MinigameKind {
        MinigameKind::Dodgeball
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
        self.place_players();
        self.projectiles.clear();
        self.elapsed = 0.0;
        self.spawn_timer = 0.0;
        self.book.begin();
    }

    fn update(&mut self, dt: f32, input: &dyn InputSource, rng: &mut dyn RngCore) {
        if !self.book.is_active() {
            return;
        }
        self.elapsed += dt;
        self.spawn_timer += dt;
        if self.spawn_timer >= spawn_interval(self.elapsed) {
            self.spawn_timer = 0.0;
            self.spawn(rng);
        }

        self.move_players(dt, input);
        self.move_projectiles(dt);
        self.resolve_hits();

        if self.book.remaining() == 1 {
            if let Some(survivor) = self.dodgers.iter().find(|d| !d.out).map(|d| d.id) {
                self.book.finish_next(survivor);
            }
        }
        if self.book.remaining() == 0 {
            self.book.complete();
        }
    }
}
