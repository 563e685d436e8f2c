//! Scripted players that drive minigames through the same input queries
//! real players use.
use crumbparty_game::minigame::{Dodgeball, MemoryMatch, StarCatch};
use crumbparty_game::{Button, Direction, InputSource, InputState, MiniGame, MinigameKind, PlayerId};
use rand::Rng;

/// How well one bot plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotProfile {
    /// Chance of tapping Action on any frame the button is up.
    pub tap_chance: f64,
    /// Chance of misremembering each symbol of a memory sequence.
    pub memory_error_rate: f64,
    /// Distance at which a dodger starts running from a ball.
    pub alert_radius: f32,
}

impl BotProfile {
    /// Profiles that differ per seat so placements are not all ties.
    #[must_use]
    pub fn for_seat(slot: usize) -> Self {
        let seat = u8::try_from(slot.min(5)).unwrap_or(5);
        Self {
            tap_chance: 0.9 - f64::from(seat) * 0.1,
            memory_error_rate: f64::from(seat) * 0.05,
            alert_radius: 2.5 - f32::from(seat) * 0.3,
        }
    }
}

#[derive(Debug, Clone)]
struct Bot {
    id: PlayerId,
    profile: BotProfile,
    remembered: Vec<Direction>,
    remembered_round: u32,
}

/// One bot per seat.
#[derive(Debug, Clone)]
pub struct BotTeam {
    bots: Vec<Bot>,
}

impl BotTeam {
    #[must_use]
    pub fn new(players: &[PlayerId]) -> Self {
        let bots = players
            .iter()
            .enumerate()
            .map(|(slot, &id)| Bot {
                id,
                profile: BotProfile::for_seat(slot),
                remembered: Vec::new(),
                remembered_round: 0,
            })
            .collect();
        Self { bots }
    }

    /// Set this frame's buttons for every bot.
    pub fn drive<R: Rng>(&mut self, game: &dyn MiniGame, input: &mut InputState, rng: &mut R) {
        match game.kind() {
            MinigameKind::Racer => self.tap(input, rng),
            MinigameKind::Dodgeball => {
                if let Some(dodgeball) = game.as_any().downcast_ref::<Dodgeball>() {
                    self.dodge(dodgeball, input);
                }
            }
            MinigameKind::StarCatch => {
                if let Some(stars) = game.as_any().downcast_ref::<StarCatch>() {
                    self.chase(stars, input);
                }
            }
            MinigameKind::MemoryMatch => {
                if let Some(memory) = game.as_any().downcast_ref::<MemoryMatch>() {
                    self.recall(memory, input, rng);
                }
            }
        }
    }

    fn tap<R: Rng>(&self, input: &mut InputState, rng: &mut R) {
        for bot in &self.bots {
            if input.pressing(bot.id, Button::Action) {
                input.release(bot.id, Button::Action);
            } else if rng.gen_bool(bot.profile.tap_chance) {
                input.press(bot.id, Button::Action);
            }
        }
    }

    fn dodge(&self, game: &Dodgeball, input: &mut InputState) {
        for bot in &self.bots {
            input.release_all(bot.id);
            if game.is_out(bot.id) {
                continue;
            }
            let Some((x, y)) = game.position(bot.id) else {
                continue;
            };
            let nearest = game
                .projectiles()
                .iter()
                .map(|b| (b, (b.x - x).hypot(b.y - y)))
                .filter(|(_, distance)| *distance < bot.profile.alert_radius)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            let Some((ball, _)) = nearest else {
                continue;
            };
            // Step sideways out of the ball's lane.
            let button = match ball.heading {
                Direction::Up | Direction::Down if x >= ball.x => Button::Right,
                Direction::Up | Direction::Down => Button::Left,
                Direction::Left | Direction::Right if y >= ball.y => Button::Down,
                Direction::Left | Direction::Right => Button::Up,
            };
            input.press(bot.id, button);
        }
    }

    fn chase(&self, game: &StarCatch, input: &mut InputState) {
        for bot in &self.bots {
            input.release_all(bot.id);
            let Some(lane) = game.lane(bot.id) else {
                continue;
            };
            let gap = lane.star_x - lane.catcher_x;
            if gap > 0.2 {
                input.press(bot.id, Button::Right);
            } else if gap < -0.2 {
                input.press(bot.id, Button::Left);
            }
        }
    }

    fn recall<R: Rng>(&mut self, game: &MemoryMatch, input: &mut InputState, rng: &mut R) {
        for bot in &mut self.bots {
            let was_down = Direction::ALL
                .iter()
                .any(|dir| input.pressing(bot.id, dir.button()));
            input.release_all(bot.id);

            if let Some(shown) = game.shown_sequence()
                && bot.remembered_round != game.round()
            {
                bot.remembered = shown
                    .iter()
                    .map(|&symbol| {
                        if rng.gen_bool(bot.profile.memory_error_rate) {
                            Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
                        } else {
                            symbol
                        }
                    })
                    .collect();
                bot.remembered_round = game.round();
            }

            if was_down || !game.is_accepting_input() {
                continue;
            }
            let typed = game.entry(bot.id).map_or(0, <[Direction]>::len);
            if let Some(next) = bot.remembered.get(typed) {
                input.press(bot.id, next.button());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumbparty_game::Roster;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn pid(n: u8) -> PlayerId {
        PlayerId::new(n).unwrap()
    }

    #[test]
    fn seats_get_weaker_profiles() {
        let first = BotProfile::for_seat(0);
        let last = BotProfile::for_seat(5);
        assert!(first.tap_chance > last.tap_chance);
        assert!(first.memory_error_rate < last.memory_error_rate);
        assert!(last.tap_chance > 0.0);
    }

    #[test]
    fn tapping_alternates_the_action_button() {
        let roster = Roster::new(1);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let team = BotTeam::new(&roster.ids());
        let mut input = InputState::new();
        let mut downs = 0;
        for _ in 0..100 {
            team.tap(&mut input, &mut rng);
            if input.just_pressed(pid(1), Button::Action) {
                downs += 1;
            }
            input.end_frame();
        }
        assert!(downs > 20, "{downs}");
        assert!(downs <= 50, "{downs}");
    }

    #[test]
    fn chasers_move_toward_their_star() {
        let roster = Roster::new(2);
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let mut game = StarCatch::new(&roster);
        game.setup(&mut rng);
        let team = BotTeam::new(&roster.ids());
        let mut input = InputState::new();
        team.chase(&game, &mut input);
        for id in [pid(1), pid(2)] {
            let lane = game.lane(id).unwrap();
            let gap = lane.star_x - lane.catcher_x;
            let (ax, _) = input.axis(id);
            if gap.abs() > 0.2 {
                assert!((ax.signum() - gap.signum()).abs() < f32::EPSILON);
            }
        }
    }
}
