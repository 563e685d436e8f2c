//! Board-mode session: turn order, dice, tile effects and minigame hand-off.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::board::{
    BoardError, BoardGraph, DirectionalChoice, JunctionChooser, MoveOutcome, TileType,
};
use crate::events::{SessionEvent, SessionSink};
use crate::input::InputSource;
use crate::minigame::{MinigameKind, MinigameOutcome, MinigameRun};
use crate::player::{Player, PlayerId, Roster};
use crate::rush::{self, RushController};
use crate::screen::Screen;
use crate::settings::{Settings, SettingsError};

/// What one turn did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub player: PlayerId,
    pub roll: u32,
    pub movement: MoveOutcome,
    pub bought_fruit: bool,
    /// Minigame queued by this turn, if any.
    pub pending_minigame: Option<MinigameKind>,
    /// Whether this was the last turn of a round.
    pub round_complete: bool,
}

/// Everything a board game in progress owns.
#[derive(Debug, Clone)]
pub struct BoardSession {
    settings: Settings,
    board: BoardGraph,
    roster: Roster,
    rng: ChaCha20Rng,
    turn: usize,
    round: u32,
    minigame_this_round: bool,
    pending_minigame: Option<MinigameKind>,
}

impl BoardSession {
    /// Start a session with an entropy-seeded RNG.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings are invalid.
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        Self::with_rng(settings, ChaCha20Rng::from_entropy())
    }

    /// Start a reproducible session.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings are invalid.
    pub fn with_seed(settings: Settings, seed: u64) -> Result<Self, SettingsError> {
        Self::with_rng(settings, ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(settings: Settings, rng: ChaCha20Rng) -> Result<Self, SettingsError> {
        settings.validate()?;
        let board = settings.build_board()?;
        let roster = settings.roster();
        log::info!(
            "board session on '{}' with {} players",
            board.name(),
            roster.player_count()
        );
        Ok(Self {
            settings,
            board,
            roster,
            rng,
            turn: 0,
            round: 1,
            minigame_this_round: false,
            pending_minigame: None,
        })
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn board(&self) -> &BoardGraph {
        &self.board
    }

    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    /// 1-based round counter.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Player whose turn it is.
    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        self.roster.players().get(self.turn).map(|p| p.id)
    }

    #[must_use]
    pub const fn pending_minigame(&self) -> Option<MinigameKind> {
        self.pending_minigame
    }

    /// Roll the session die.
    pub fn roll_dice(&mut self) -> u32 {
        self.rng.gen_range(1..=self.settings.dice_sides.max(1))
    }

    /// Roll and move the active player.
    ///
    /// The caller supplies the junction chooser; use
    /// [`BoardSession::take_turn_from_input`] to steer by held direction.
    ///
    /// # Errors
    ///
    /// Returns an error when the player's token cannot move.
    pub fn take_turn(
        &mut self,
        chooser: &mut dyn JunctionChooser,
        sink: &mut dyn SessionSink,
    ) -> Result<TurnOutcome, BoardError> {
        let roll = self.roll_dice();
        self.take_turn_with_roll(roll, chooser, sink)
    }

    /// Roll and move the active player, taking junctions in the direction
    /// that player holds on `input`.
    ///
    /// # Errors
    ///
    /// Returns an error when the player's token cannot move.
    pub fn take_turn_from_input(
        &mut self,
        input: &dyn InputSource,
        sink: &mut dyn SessionSink,
    ) -> Result<TurnOutcome, BoardError> {
        let Some(player) = self.active_player() else {
            return Err(BoardError::Empty);
        };
        let mut chooser = DirectionalChoice::new(input.axis(player));
        self.take_turn(&mut chooser, sink)
    }

    /// Move the active player by a given roll and apply the landing tile.
    ///
    /// # Errors
    ///
    /// Returns an error when the roll is zero or the player's token cannot
    /// move; the turn does not advance in either case.
    pub fn take_turn_with_roll(
        &mut self,
        roll: u32,
        chooser: &mut dyn JunctionChooser,
        sink: &mut dyn SessionSink,
    ) -> Result<TurnOutcome, BoardError> {
        let Some(player) = self.active_player() else {
            return Err(BoardError::Empty);
        };
        let board = &self.board;
        let Some(token) = self.roster.player_mut(player) else {
            return Err(BoardError::Empty);
        };
        let movement = board.advance_player(token, roll, chooser)?;
        let name = token.name.clone();
        sink.set_screen(Screen::Board);
        log::debug!(
            "{name} rolled {roll}: {} -> {} ({:?})",
            movement.start,
            movement.landed(),
            movement.trigger
        );
        sink.record_event(SessionEvent::PlayerTurn {
            player: name,
            roll,
            from: movement.start,
            to: movement.landed(),
        });

        let mut pending = None;
        let mut bought_fruit = false;
        match movement.trigger {
            TileType::Shop => bought_fruit = self.buy_fruit(player),
            TileType::Minigame => pending = Some(self.queue_minigame()),
            TileType::Regular => {}
        }

        self.turn += 1;
        let round_complete = self.turn >= self.roster.player_count();
        if round_complete {
            if self.settings.minigame_every_round
                && !self.minigame_this_round
                && self.pending_minigame.is_none()
            {
                pending = Some(self.queue_minigame());
            }
            self.turn = 0;
            self.round += 1;
            self.minigame_this_round = false;
        }

        Ok(TurnOutcome {
            player,
            roll,
            movement,
            bought_fruit,
            pending_minigame: pending,
            round_complete,
        })
    }

    fn queue_minigame(&mut self) -> MinigameKind {
        let kind = MinigameKind::ALL[self.rng.gen_range(0..MinigameKind::ALL.len())];
        self.pending_minigame = Some(kind);
        self.minigame_this_round = true;
        kind
    }

    /// Trade crumbs for one fruit if the player can afford it.
    pub fn buy_fruit(&mut self, player: PlayerId) -> bool {
        let price = self.settings.fruit_price;
        let Some(buyer) = self.roster.player_mut(player) else {
            return false;
        };
        if buyer.crumbs < price {
            return false;
        }
        buyer.remove_crumbs(price);
        buyer.add_fruit(1);
        log::debug!("{} bought fruit for {price} crumbs", buyer.name);
        true
    }

    /// Start a specific minigame for the whole roster.
    pub fn start_minigame(
        &mut self,
        kind: MinigameKind,
        sink: &mut dyn SessionSink,
    ) -> MinigameRun {
        let game = rush::descriptor(kind).build(&self.roster);
        MinigameRun::start(game, &self.roster, &mut self.rng, sink)
    }

    /// Start the queued minigame, if one is waiting.
    pub fn start_pending_minigame(&mut self, sink: &mut dyn SessionSink) -> Option<MinigameRun> {
        let kind = self.pending_minigame.take()?;
        Some(self.start_minigame(kind, sink))
    }

    /// Advance a running minigame by one frame; returns the outcome on the
    /// frame it completes.
    pub fn play_frame(
        &mut self,
        run: &mut MinigameRun,
        dt: f32,
        input: &dyn InputSource,
        sink: &mut dyn SessionSink,
    ) -> Option<MinigameOutcome> {
        run.update(dt, input, &mut self.rng, &mut self.roster, sink)
    }

    /// A rush over every minigame using the session RNG.
    pub fn start_rush(&mut self) -> RushController {
        RushController::with_catalog(&mut self.rng)
    }

    /// Players ordered by crumbs, wins and id.
    #[must_use]
    pub fn standings(&self) -> Vec<&Player> {
        rush::final_standings(self.roster.players())
    }

    /// Back to round one with every player on the start tile.
    pub fn reset(&mut self) {
        self.roster.reset();
        self.turn = 0;
        self.round = 1;
        self.minigame_this_round = false;
        self.pending_minigame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::FirstCandidate;
    use crate::events::RecordingSink;
    use crate::input::{Button, InputState, NoInput};

    fn pid(n: u8) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    fn session(player_count: usize, every_round: bool) -> BoardSession {
        let settings = Settings {
            player_count,
            minigame_every_round: every_round,
            ..Settings::default()
        };
        BoardSession::with_seed(settings, 42).unwrap()
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = Settings {
            player_count: 9,
            ..Settings::default()
        };
        assert!(BoardSession::with_seed(settings, 1).is_err());
    }

    #[test]
    fn dice_stay_in_range() {
        let mut session = session(2, true);
        for _ in 0..200 {
            assert!((1..=6).contains(&session.roll_dice()));
        }
    }

    #[test]
    fn turns_rotate_and_emit_events() {
        let mut session = session(2, false);
        let mut sink = RecordingSink::new();
        // Meadow tile 1 is blue, so a roll of 1 is a quiet move.
        let first = session
            .take_turn_with_roll(1, &mut FirstCandidate, &mut sink)
            .unwrap();
        assert_eq!(first.player, pid(1));
        assert_eq!(first.movement.path, vec![1]);
        assert!(!first.round_complete);
        assert_eq!(session.active_player(), Some(pid(2)));

        let second = session
            .take_turn_with_roll(1, &mut FirstCandidate, &mut sink)
            .unwrap();
        assert!(second.round_complete);
        assert_eq!(second.pending_minigame, None);
        assert_eq!(session.round(), 2);
        assert_eq!(session.active_player(), Some(pid(1)));

        let turns: Vec<_> = sink.events_of("player_turn").collect();
        assert_eq!(turns.len(), 2);
        assert_eq!(
            turns[0],
            &SessionEvent::PlayerTurn {
                player: "Player 1".to_string(),
                roll: 1,
                from: 0,
                to: 1,
            }
        );
    }

    #[test]
    fn a_zero_roll_is_rejected_and_keeps_the_turn() {
        let mut session = session(2, false);
        let mut sink = RecordingSink::new();
        assert_eq!(
            session.take_turn_with_roll(0, &mut FirstCandidate, &mut sink),
            Err(BoardError::NoSteps)
        );
        assert_eq!(session.active_player(), Some(pid(1)));
        assert_eq!(session.roster().player(pid(1)).unwrap().current_tile, 0);
        assert!(sink.events.is_empty());
        assert!(sink.last_screen().is_none());
    }

    #[test]
    fn turns_show_the_board() {
        let mut session = session(2, false);
        let mut sink = RecordingSink::new();
        session
            .take_turn_with_roll(1, &mut FirstCandidate, &mut sink)
            .unwrap();
        assert_eq!(sink.last_screen(), Some(&Screen::Board));
    }

    #[test]
    fn junctions_follow_the_active_players_input() {
        // Crossroads tile 0 forks up to tile 1 and down to tile 7.
        let first_step = |held: Button| {
            let settings = Settings {
                player_count: 2,
                board: "crossroads".to_string(),
                ..Settings::default()
            };
            let mut session = BoardSession::with_seed(settings, 3).unwrap();
            let mut input = InputState::new();
            input.press(pid(1), held);
            input.press(pid(2), Button::Down);
            let mut sink = RecordingSink::new();
            let outcome = session.take_turn_from_input(&input, &mut sink).unwrap();
            assert_eq!(outcome.player, pid(1));
            outcome.movement.path[0]
        };
        assert_eq!(first_step(Button::Up), 1);
        assert_eq!(first_step(Button::Down), 7);
    }

    #[test]
    fn minigame_tiles_queue_a_minigame() {
        let mut session = session(2, false);
        let mut sink = RecordingSink::new();
        // Meadow tile 2 is red.
        let outcome = session
            .take_turn_with_roll(2, &mut FirstCandidate, &mut sink)
            .unwrap();
        assert_eq!(outcome.movement.trigger, TileType::Minigame);
        let kind = outcome.pending_minigame.unwrap();
        assert_eq!(session.pending_minigame(), Some(kind));

        let run = session.start_pending_minigame(&mut sink).unwrap();
        assert_eq!(run.kind(), kind);
        assert!(session.pending_minigame().is_none());
        assert_eq!(sink.events_of("minigame_start").count(), 1);
    }

    #[test]
    fn a_quiet_round_forces_a_minigame() {
        let mut session = session(2, true);
        let mut sink = RecordingSink::new();
        session
            .take_turn_with_roll(1, &mut FirstCandidate, &mut sink)
            .unwrap();
        let last = session
            .take_turn_with_roll(1, &mut FirstCandidate, &mut sink)
            .unwrap();
        assert!(last.round_complete);
        assert!(last.pending_minigame.is_some());
    }

    #[test]
    fn shops_sell_fruit_to_players_who_can_pay() {
        let mut session = session(2, false);
        let mut sink = RecordingSink::new();
        session.roster_mut().player_mut(pid(1)).unwrap().crumbs = 7;
        // Meadow tile 7 is green.
        let outcome = session
            .take_turn_with_roll(7, &mut FirstCandidate, &mut sink)
            .unwrap();
        assert_eq!(outcome.movement.trigger, TileType::Shop);
        assert!(outcome.bought_fruit);
        let buyer = session.roster().player(pid(1)).unwrap();
        assert_eq!((buyer.crumbs, buyer.fruit), (2, 1));

        assert!(!session.buy_fruit(pid(1)));
        assert!(!session.buy_fruit(pid(6)));
    }

    #[test]
    fn minigame_results_land_on_the_roster() {
        let mut session = session(3, false);
        let mut sink = RecordingSink::new();
        let mut run = session.start_minigame(MinigameKind::StarCatch, &mut sink);
        let mut outcome = None;
        for _ in 0..1_000 {
            outcome = session.play_frame(&mut run, 0.05, &NoInput, &mut sink);
            if outcome.is_some() {
                break;
            }
        }
        let outcome = outcome.expect("star-catch ends on its timer");
        let total: u32 = session.roster().players().iter().map(|p| p.crumbs).sum();
        assert_eq!(total, outcome.crumbs.iter().sum::<u32>());
        assert_eq!(session.standings()[0].id, outcome.winner.unwrap());
    }

    #[test]
    fn reset_returns_to_round_one() {
        let mut session = session(2, true);
        let mut sink = RecordingSink::new();
        session.take_turn(&mut FirstCandidate, &mut sink).unwrap();
        session.take_turn(&mut FirstCandidate, &mut sink).unwrap();
        session.reset();
        assert_eq!(session.round(), 1);
        assert_eq!(session.active_player(), Some(pid(1)));
        assert!(session.pending_minigame().is_none());
        assert!(
            session
                .roster()
                .players()
                .iter()
                .all(|p| p.current_tile == 0 && p.previous_tile.is_none())
        );
    }
}
