//! Minigame lifecycle shared by every rule engine.
//!
//! Every minigame walks `Setup -> Active -> Completed` exactly once. Rule
//! engines own their per-frame state and a [`RoundBook`] with the finish
//! flags and placements; [`MinigameRun`] wraps an engine and applies the
//! completion bookkeeping (wins, crumbs, events, scores, results screen) once.
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use thiserror::Error;

use crate::events::{SessionEvent, SessionSink};
use crate::input::InputSource;
use crate::leaderboard::{ScoreOrder, ScoreRecord};
use crate::player::{PlayerId, Roster};
use crate::screen::Screen;

pub mod dodgeball;
pub mod memory_match;
pub mod racer;
pub mod star_catch;

pub use dodgeball::{Dodgeball, DodgeballConfig, Projectile, spawn_interval};
pub use memory_match::{MemoryMatch, MemoryMatchConfig, score_entry};
pub use racer::{Racer, RacerConfig};
pub use star_catch::{StarCatch, StarCatchConfig};

/// Rule-engine tuning that would stall or panic a game.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("fall speed range {min}..={max} is empty")]
    FallSpeedRange { min: f32, max: f32 },
    #[error("field width {width} leaves no room for a catcher reaching {reach}")]
    FieldTooNarrow { width: f32, reach: f32 },
    #[error("code length starts at {start} and must grow to pass {max}")]
    CodeLength { start: usize, max: usize },
}

/// Reject zero, negative and non-finite tuning values.
pub(crate) fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Crumbs handed to first place; last place always gets zero.
pub const TOP_AWARD: u32 = 5;

/// Crumb award per placement, best first.
///
/// `crumbs(p) = floor(5 * (n - p) / (n - 1))` for 1-indexed `p`; fewer than
/// two players earn nothing.
#[must_use]
pub fn crumb_awards(num_players: usize) -> Vec<u32> {
    if num_players < 2 {
        return Vec::new();
    }
    let n = u32::try_from(num_players).unwrap_or(u32::MAX);
    (1..=n).map(|p| TOP_AWARD * (n - p) / (n - 1)).collect()
}

/// The closed set of minigames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigameKind {
    Racer,
    Dodgeball,
    StarCatch,
    MemoryMatch,
}

impl MinigameKind {
    pub const ALL: [Self; 4] = [
        Self::Racer,
        Self::Dodgeball,
        Self::StarCatch,
        Self::MemoryMatch,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Racer => "Reaction Racer",
            Self::Dodgeball => "Dodgeball",
            Self::StarCatch => "Catching Stars",
            Self::MemoryMatch => "Memory Match",
        }
    }

    #[must_use]
    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Racer => {
                "Tap your action button as fast as you can. First across the line wins."
            }
            Self::Dodgeball => {
                "Move to dodge the balls flying across the court. Last one standing wins."
            }
            Self::StarCatch => {
                "Slide your basket under your own star. Most stars in 30 seconds wins."
            }
            Self::MemoryMatch => {
                "Watch the arrows, then enter them in order. Every correct arrow scores."
            }
        }
    }

    /// Whether a smaller or larger score is better on this game's leaderboard.
    #[must_use]
    pub const fn score_order(self) -> ScoreOrder {
        match self {
            Self::Racer => ScoreOrder::LowerIsBetter,
            Self::Dodgeball | Self::StarCatch | Self::MemoryMatch => ScoreOrder::HigherIsBetter,
        }
    }
}

impl fmt::Display for MinigameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle phase of a minigame instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Active,
    Completed,
}

/// Finish flags and placements for one minigame instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundBook {
    players: Vec<PlayerId>,
    finished: Vec<bool>,
    placement: Vec<Option<PlayerId>>,
    phase: Phase,
}

impl RoundBook {
    #[must_use]
    pub fn new(players: Vec<PlayerId>) -> Self {
        let n = players.len();
        Self {
            players,
            finished: vec![false; n],
            placement: vec![None; n],
            phase: Phase::Setup,
        }
    }

    #[must_use]
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Clear finish state and enter `Active`. Ignored once completed.
    pub fn begin(&mut self) {
        if self.is_complete() {
            return;
        }
        self.finished.fill(false);
        self.placement.fill(None);
        self.phase = Phase::Active;
    }

    /// Position of a player in the participant list.
    #[must_use]
    pub fn slot_of(&self, player: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| *p == player)
    }

    #[must_use]
    pub fn is_finished(&self, player: PlayerId) -> bool {
        self.slot_of(player)
            .is_some_and(|slot| self.finished[slot])
    }

    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.finished.iter().filter(|f| **f).count()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.player_count() - self.finished_count()
    }

    /// Record a finish in arrival order: the best free placement.
    ///
    /// Returns the 0-based placement, or `None` for unknown or already
    /// finished players.
    pub fn finish_next(&mut self, player: PlayerId) -> Option<usize> {
        let rank = self.placement.iter().position(Option::is_none)?;
        self.record_finish(player, rank)
    }

    /// Record an elimination: the worst free placement.
    pub fn finish_from_back(&mut self, player: PlayerId) -> Option<usize> {
        let rank = self.placement.iter().rposition(Option::is_none)?;
        self.record_finish(player, rank)
    }

    fn record_finish(&mut self, player: PlayerId, rank: usize) -> Option<usize> {
        if !self.is_active() {
            return None;
        }
        let slot = self.slot_of(player)?;
        if self.finished[slot] {
            return None;
        }
        self.finished[slot] = true;
        self.placement[rank] = Some(player);
        Some(rank)
    }

    /// Fill every placement from scores, best first. Equal scores keep
    /// participant order.
    pub fn place_by_score(&mut self, scores: &[u32]) {
        if !self.is_active() {
            return;
        }
        let score = |slot: usize| scores.get(slot).copied().unwrap_or(0);
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by(|&a, &b| score(b).cmp(&score(a)));
        for (rank, slot) in order.into_iter().enumerate() {
            self.placement[rank] = Some(self.players[slot]);
        }
        self.finished.fill(true);
    }

    /// Enter `Completed`. Returns `true` only on the first call.
    pub fn complete(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.phase = Phase::Completed;
        true
    }

    /// Placements best-first; `None` marks a slot nobody filled.
    #[must_use]
    pub fn placements(&self) -> &[Option<PlayerId>] {
        &self.placement
    }
}

/// Capability every rule engine implements.
pub trait MiniGame: fmt::Debug {
    fn kind(&self) -> MinigameKind;

    /// Finish flags, placements and phase.
    fn book(&self) -> &RoundBook;

    /// Concrete engine access for frontends and bots that read engine state.
    fn as_any(&self) -> &dyn Any;

    /// Build per-player starting state and enter `Active`. Calling it again
    /// before completion restarts the game; after completion it is a no-op.
    fn setup(&mut self, rng: &mut dyn RngCore);

    /// Advance one frame.
    fn update(&mut self, dt: f32, input: &dyn InputSource, rng: &mut dyn RngCore);

    /// Score reported to the leaderboard, for games that keep one.
    fn score_value(&self, _player: PlayerId) -> Option<u32> {
        None
    }

    fn phase(&self) -> Phase {
        self.book().phase()
    }

    fn is_complete(&self) -> bool {
        self.book().is_complete()
    }

    fn placements(&self) -> &[Option<PlayerId>] {
        self.book().placements()
    }
}

/// What a finished minigame handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameOutcome {
    pub minigame: MinigameKind,
    pub placements: Vec<Option<PlayerId>>,
    /// Crumbs per placement, aligned with `placements`.
    pub crumbs: Vec<u32>,
    pub winner: Option<PlayerId>,
}

/// A running minigame plus its one-shot completion handling.
#[derive(Debug)]
pub struct MinigameRun {
    game: Box<dyn MiniGame>,
    outcome: Option<MinigameOutcome>,
}

impl MinigameRun {
    /// Set the game up, announce it and return the running instance.
    pub fn start(
        mut game: Box<dyn MiniGame>,
        roster: &Roster,
        rng: &mut dyn RngCore,
        sink: &mut dyn SessionSink,
    ) -> Self {
        game.setup(rng);
        let kind = game.kind();
        let players: Vec<String> = game
            .book()
            .players()
            .iter()
            .map(|id| roster.name_or_unknown(Some(*id)))
            .collect();
        log::info!("minigame {kind} started with {} players", players.len());
        sink.record_event(SessionEvent::MinigameStart {
            minigame: kind.name().to_string(),
            players,
        });
        Self {
            game,
            outcome: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> MinigameKind {
        self.game.kind()
    }

    #[must_use]
    pub fn game(&self) -> &dyn MiniGame {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> &mut dyn MiniGame {
        self.game.as_mut()
    }

    /// Whether completion has been handled.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&MinigameOutcome> {
        self.outcome.as_ref()
    }

    /// Run one frame; returns the outcome on the frame the game completes.
    pub fn update(
        &mut self,
        dt: f32,
        input: &dyn InputSource,
        rng: &mut dyn RngCore,
        roster: &mut Roster,
        sink: &mut dyn SessionSink,
    ) -> Option<MinigameOutcome> {
        if self.is_complete() {
            return None;
        }
        self.game.update(dt, input, rng);
        if !self.game.is_complete() {
            return None;
        }
        let placements = self.game.placements().to_vec();
        self.on_complete(&placements, roster, sink)
    }

    /// Apply completion: a win for first place, crumbs for everyone placed,
    /// the end event, leaderboard scores and the results screen.
    ///
    /// Only the first call has any effect; later calls return `None`.
    pub fn on_complete(
        &mut self,
        placements: &[Option<PlayerId>],
        roster: &mut Roster,
        sink: &mut dyn SessionSink,
    ) -> Option<MinigameOutcome> {
        let kind = self.game.kind();
        if self.outcome.is_some() {
            log::debug!("ignoring repeated completion of {kind}");
            return None;
        }

        let awards = crumb_awards(self.game.book().player_count());
        let winner = placements.first().copied().flatten();
        if let Some(player) = winner.and_then(|id| roster.player_mut(id)) {
            player.add_win();
        }

        let mut names = Vec::with_capacity(placements.len());
        let mut crumbs = Vec::with_capacity(placements.len());
        for (rank, entry) in placements.iter().enumerate() {
            let award = awards.get(rank).copied().unwrap_or(0);
            match entry.and_then(|id| roster.player_mut(id)) {
                Some(player) => player.add_crumbs(award),
                None => log::warn!("{kind}: placement {} has no player", rank + 1),
            }
            names.push(roster.name_or_unknown(*entry));
            crumbs.push(award);
        }

        for id in placements.iter().flatten() {
            if let Some(score) = self.game.score_value(*id) {
                sink.record_score(ScoreRecord {
                    minigame: kind.name().to_string(),
                    player: roster.name_or_unknown(Some(*id)),
                    score,
                    order: kind.score_order(),
                });
            }
        }

        log::info!("minigame {kind} complete: {}", names.join(", "));
        sink.record_event(SessionEvent::MinigameEnd {
            minigame: kind.name().to_string(),
            placements: names.clone(),
            crumbs: crumbs.clone(),
        });
        sink.set_screen(Screen::Results {
            minigame: kind.name().to_string(),
            placements: names,
            crumbs: crumbs.clone(),
        });

        let outcome = MinigameOutcome {
            minigame: kind,
            placements: placements.to_vec(),
            crumbs,
            winner,
        };
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::input::NoInput;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn pid(n: u8) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    #[test]
    fn crumb_table_matches_reference_counts() {
        assert_eq!(crumb_awards(6), vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(crumb_awards(4), vec![5, 3, 1, 0]);
        assert_eq!(crumb_awards(2), vec![5, 0]);
        assert!(crumb_awards(1).is_empty());
        assert!(crumb_awards(0).is_empty());
    }

    #[test]
    fn crumb_table_properties_hold_for_every_size() {
        for n in 2..=6usize {
            let awards = crumb_awards(n);
            assert_eq!(awards.len(), n);
            assert_eq!(awards[0], 5);
            assert_eq!(awards[n - 1], 0);
            assert!(awards.windows(2).all(|w| w[0] >= w[1]));
            let n32 = u32::try_from(n).unwrap();
            for (i, award) in awards.iter().enumerate() {
                let p = u32::try_from(i + 1).unwrap();
                assert_eq!(*award, 5 * (n32 - p) / (n32 - 1));
            }
        }
    }

    #[test]
    fn round_book_fills_from_both_ends() {
        let mut book = RoundBook::new(vec![pid(1), pid(2), pid(3)]);
        assert_eq!(book.finish_next(pid(1)), None, "inactive books ignore finishes");
        book.begin();
        assert_eq!(book.finish_from_back(pid(2)), Some(2));
        assert_eq!(book.finish_from_back(pid(2)), None);
        assert_eq!(book.finish_next(pid(3)), Some(0));
        assert_eq!(book.finish_next(pid(1)), Some(1));
        assert_eq!(book.remaining(), 0);
        assert_eq!(book.placements(), &[Some(pid(3)), Some(pid(1)), Some(pid(2))]);
        assert!(book.complete());
        assert!(!book.complete());
        book.begin();
        assert!(book.is_complete(), "completed books never reopen");
    }

    #[test]
    fn place_by_score_is_stable_on_ties() {
        let mut book = RoundBook::new(vec![pid(1), pid(2), pid(3), pid(4)]);
        book.begin();
        book.place_by_score(&[2, 7, 2, 7]);
        assert_eq!(
            book.placements(),
            &[Some(pid(2)), Some(pid(4)), Some(pid(1)), Some(pid(3))]
        );
        assert_eq!(book.finished_count(), 4);
    }

    /// Engine that finishes on its first update in a fixed order.
    #[derive(Debug)]
    struct Scripted {
        book: RoundBook,
        order: Vec<PlayerId>,
    }

    impl MiniGame for Scripted {
        fn kind(&self) -> MinigameKind {
            MinigameKind::StarCatch
        }

        fn book(&self) -> &RoundBook {
            &self.book
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn setup(&mut self, _rng: &mut dyn RngCore) {
            self.book.begin();
        }

        fn update(&mut self, _dt: f32, _input: &dyn InputSource, _rng: &mut dyn RngCore) {
            for id in self.order.clone() {
                self.book.finish_next(id);
            }
            self.book.complete();
        }

        fn score_value(&self, player: PlayerId) -> Option<u32> {
            Some(u32::from(player.get()) * 10)
        }
    }

    fn scripted_run(roster: &Roster, sink: &mut RecordingSink) -> MinigameRun {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let game = Scripted {
            book: RoundBook::new(roster.ids()),
            order: vec![pid(3), pid(1), pid(4), pid(2)],
        };
        MinigameRun::start(Box::new(game), roster, &mut rng, sink)
    }

    #[test]
    fn completion_awards_wins_crumbs_and_reports() {
        let mut roster = Roster::new(4);
        let mut sink = RecordingSink::new();
        let mut run = scripted_run(&roster, &mut sink);
        let mut rng = ChaCha20Rng::seed_from_u64(2);

        let outcome = run
            .update(1.0 / 60.0, &NoInput, &mut rng, &mut roster, &mut sink)
            .expect("completes on first frame");
        assert_eq!(outcome.winner, Some(pid(3)));
        assert_eq!(outcome.crumbs, vec![5, 3, 1, 0]);

        let crumbs: Vec<u32> = roster.players().iter().map(|p| p.crumbs).collect();
        assert_eq!(crumbs, vec![3, 0, 5, 1]);
        let wins: Vec<u32> = roster.players().iter().map(|p| p.wins).collect();
        assert_eq!(wins, vec![0, 0, 1, 0]);

        assert_eq!(sink.events_of("minigame_start").count(), 1);
        assert_eq!(sink.events_of("minigame_end").count(), 1);
        assert_eq!(sink.scores.len(), 4);
        assert_eq!(sink.scores[0].player, "Player 3");
        assert_eq!(sink.scores[0].score, 30);
        assert!(matches!(sink.last_screen(), Some(Screen::Results { .. })));
    }

    #[test]
    fn completion_is_idempotent() {
        let mut roster = Roster::new(4);
        let mut sink = RecordingSink::new();
        let mut run = scripted_run(&roster, &mut sink);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        run.update(0.1, &NoInput, &mut rng, &mut roster, &mut sink);
        let snapshot = roster.clone();
        let events = sink.events.len();

        let placements = run.game().placements().to_vec();
        assert!(run.on_complete(&placements, &mut roster, &mut sink).is_none());
        assert!(
            run.update(0.1, &NoInput, &mut rng, &mut roster, &mut sink)
                .is_none()
        );
        assert_eq!(roster, snapshot);
        assert_eq!(sink.events.len(), events);
    }

    #[test]
    fn missing_placements_read_unknown() {
        let mut roster = Roster::new(3);
        let mut sink = RecordingSink::new();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let game = Scripted {
            book: RoundBook::new(roster.ids()),
            order: Vec::new(),
        };
        let mut run = MinigameRun::start(Box::new(game), &roster, &mut rng, &mut sink);
        let outcome = run
            .on_complete(&[None, Some(pid(2)), None], &mut roster, &mut sink)
            .unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(roster.player(pid(2)).unwrap().crumbs, 2);
        assert!(roster.players().iter().all(|p| p.wins == 0));
        let Some(SessionEvent::MinigameEnd { placements, .. }) = sink.events.last() else {
            panic!("expected an end event");
        };
        assert_eq!(placements, &["Unknown", "Player 2", "Unknown"]);
    }
}
