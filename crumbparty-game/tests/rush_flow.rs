use crumbparty_game::minigame::{MemoryMatch, Racer, RacerConfig};
use crumbparty_game::{
    Button, Direction, InputState, MiniGame, MinigameKind, MinigameRun, PlayerId, RecordingSink,
    Roster, RushController, Screen, SessionEvent, crumb_awards, final_standings, winners,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeSet;

const DT: f32 = 1.0 / 30.0;
const FRAME_LIMIT: usize = 200_000;

fn pid(n: u8) -> PlayerId {
    PlayerId::new(n).unwrap()
}

/// Scripted players: everyone mashes Action and replays memory sequences
/// perfectly; dodgeball and star-catch players stand still.
#[derive(Default)]
struct ScriptedPlayers {
    remembered: Vec<Direction>,
}

impl ScriptedPlayers {
    fn press(&mut self, game: &dyn MiniGame, input: &mut InputState, frame: usize) {
        let ids = game.book().players().to_vec();
        for id in &ids {
            input.release_all(*id);
        }
        if frame % 2 == 1 {
            return;
        }
        match game.kind() {
            MinigameKind::Racer => {
                for id in &ids {
                    input.press(*id, Button::Action);
                }
            }
            MinigameKind::MemoryMatch => {
                let Some(memory) = game.as_any().downcast_ref::<MemoryMatch>() else {
                    return;
                };
                if let Some(shown) = memory.shown_sequence() {
                    self.remembered = shown.to_vec();
                }
                if !memory.is_accepting_input() {
                    return;
                }
                for id in &ids {
                    let typed = memory.entry(*id).map_or(0, <[Direction]>::len);
                    if let Some(next) = self.remembered.get(typed) {
                        input.press(*id, next.button());
                    }
                }
            }
            MinigameKind::Dodgeball | MinigameKind::StarCatch => {}
        }
    }
}

fn play_to_completion(
    mut run: MinigameRun,
    roster: &mut Roster,
    rng: &mut ChaCha20Rng,
    sink: &mut RecordingSink,
) -> MinigameRun {
    let mut input = InputState::new();
    let mut players = ScriptedPlayers::default();
    for frame in 0..FRAME_LIMIT {
        players.press(run.game(), &mut input, frame);
        if run.update(DT, &input, rng, roster, sink).is_some() {
            return run;
        }
        input.end_frame();
    }
    panic!("{} did not finish", run.kind());
}

fn assert_permutation(placements: &[Option<PlayerId>], roster: &Roster) {
    let placed: BTreeSet<PlayerId> = placements.iter().flatten().copied().collect();
    let expected: BTreeSet<PlayerId> = roster.ids().into_iter().collect();
    assert_eq!(placements.len(), roster.player_count());
    assert_eq!(placed, expected);
}

#[test]
fn racer_awards_crumbs_in_arrival_order() {
    let mut roster = Roster::with_names(
        4,
        &["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()],
    );
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let mut sink = RecordingSink::new();
    let racer = Racer::with_config(
        &roster,
        RacerConfig {
            speed: 20.0 / DT,
            ..RacerConfig::default()
        },
    )
    .unwrap();
    let mut run = MinigameRun::start(Box::new(racer), &roster, &mut rng, &mut sink);

    let mut input = InputState::new();
    let mut outcome = None;
    for id in [pid(1), pid(3), pid(2), pid(4)] {
        input.press(id, Button::Action);
        outcome = run.update(DT, &input, &mut rng, &mut roster, &mut sink);
        input.release(id, Button::Action);
        input.end_frame();
    }

    let outcome = outcome.expect("fourth arrival completes the race");
    assert_eq!(
        outcome.placements,
        vec![Some(pid(1)), Some(pid(3)), Some(pid(2)), Some(pid(4))]
    );
    assert_eq!(outcome.crumbs, vec![5, 3, 1, 0]);
    let crumbs: Vec<u32> = roster.players().iter().map(|p| p.crumbs).collect();
    assert_eq!(crumbs, vec![5, 1, 3, 0]);
    assert_eq!(roster.player(pid(1)).unwrap().wins, 1);

    assert_eq!(
        sink.events.last(),
        Some(&SessionEvent::MinigameEnd {
            minigame: "Reaction Racer".to_string(),
            placements: vec!["A".into(), "C".into(), "B".into(), "D".into()],
            crumbs: vec![5, 3, 1, 0],
        })
    );
    assert!(sink.scores.is_empty(), "racer keeps no leaderboard score");
}

#[test]
fn full_rush_plays_every_minigame_once() {
    for players in [2usize, 4, 6] {
        let mut roster = Roster::new(players);
        let mut rng = ChaCha20Rng::seed_from_u64(0xC0FFEE + players as u64);
        let mut sink = RecordingSink::new();
        let mut rush = RushController::with_catalog(&mut rng);

        let mut played = Vec::new();
        while rush.has_next() {
            rush.announce_current(&mut sink);
            let run = rush
                .start_current(&roster, &mut rng, &mut sink)
                .expect("queue has a current minigame");
            let run = play_to_completion(run, &mut roster, &mut rng, &mut sink);
            let outcome = run.outcome().expect("completed run keeps its outcome");
            assert_permutation(&outcome.placements, &roster);
            played.push(outcome.minigame);
            rush.advance();
        }
        let names = rush.finish(&roster, &mut sink);

        let unique: BTreeSet<MinigameKind> = played.iter().copied().collect();
        assert_eq!(unique.len(), MinigameKind::ALL.len());
        assert_eq!(played.len(), MinigameKind::ALL.len());

        let awarded: u32 = roster.players().iter().map(|p| p.crumbs).sum();
        let table: u32 = crumb_awards(players).iter().sum();
        assert_eq!(awarded, table * 4);
        let wins: u32 = roster.players().iter().map(|p| p.wins).sum();
        assert_eq!(wins, 4);

        assert_eq!(sink.events_of("minigame_start").count(), 4);
        assert_eq!(sink.events_of("minigame_end").count(), 4);
        let expected: Vec<String> = winners(roster.players())
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, expected);
        assert_eq!(
            sink.last_screen(),
            Some(&Screen::Victory { winners: expected })
        );
        let standings = final_standings(roster.players());
        assert!(names.contains(&standings[0].name));
    }
}

#[test]
fn perfect_memory_scores_every_symbol() {
    let mut roster = Roster::new(3);
    let mut rng = ChaCha20Rng::seed_from_u64(77);
    let mut sink = RecordingSink::new();
    let run = MinigameRun::start(
        Box::new(MemoryMatch::new(&roster)),
        &roster,
        &mut rng,
        &mut sink,
    );
    let run = play_to_completion(run, &mut roster, &mut rng, &mut sink);
    assert!(run.is_complete());
    assert_eq!(sink.scores.len(), 3);
    assert!(sink.scores.iter().all(|s| s.score == 3 + 5 + 7));
    assert_eq!(
        run.outcome().unwrap().placements,
        vec![Some(pid(1)), Some(pid(2)), Some(pid(3))]
    );
}
