use anyhow::{Result, anyhow, bail, ensure};
use clap::ValueEnum;
use colored::Colorize;
use crumbparty_game::{
    BoardSession, InputState, MinigameKind, MinigameOutcome, MinigameRun, RandomChoice,
    RecordingSink, Roster, RushController, Screen, Settings, crumb_awards, winners,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::bots::BotTeam;

/// Frame step used for every simulated minigame.
pub const DT: f32 = 1.0 / 60.0;
/// Ten simulated minutes; no minigame should get close.
const FRAME_CAP: usize = 60 * 60 * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SimMode {
    /// Every minigame once in shuffled order
    Rush,
    /// Dice turns on a board with minigames in between
    Board,
}

/// What to simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimPlan {
    pub mode: SimMode,
    pub players: usize,
    pub board: String,
    pub turns: usize,
}

impl SimPlan {
    #[must_use]
    pub fn label(&self) -> String {
        match self.mode {
            SimMode::Rush => format!("rush ({} players)", self.players),
            SimMode::Board => format!(
                "board '{}' ({} players, {} turns)",
                self.board, self.players, self.turns
            ),
        }
    }
}

/// What one simulated session produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub minigames: Vec<MinigameKind>,
    pub frames: usize,
    pub turns: usize,
    pub total_crumbs: u32,
    pub winners: Vec<String>,
}

/// A passing iteration and what it played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub seed: u64,
    /// Wall-clock time, fractional milliseconds.
    pub millis: f64,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub iterations: Vec<IterationRecord>,
    pub failures: Vec<String>,
}

impl ScenarioResult {
    #[must_use]
    pub fn successful_iterations(&self) -> usize {
        self.iterations.len()
    }

    /// Mean wall-clock time of the passing iterations; zero when none passed.
    #[must_use]
    pub fn average_millis(&self) -> f64 {
        if self.iterations.is_empty() {
            return 0.0;
        }
        let total: f64 = self.iterations.iter().map(|i| i.millis).sum();
        total / f64::from(u32::try_from(self.iterations.len()).unwrap_or(u32::MAX))
    }

    /// Simulated frames across the passing iterations.
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.iterations.iter().map(|i| i.summary.frames).sum()
    }
}

pub struct Simulator {
    verbose: bool,
}

impl Simulator {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_plan(
        &self,
        plan: &SimPlan,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Simulating {} (seed: {seed})",
                        plan.label().bright_white()
                    );
                }
                self.run_single(plan, seed, iterations)
            })
            .collect()
    }

    fn run_single(&self, plan: &SimPlan, seed: u64, iterations: usize) -> ScenarioResult {
        log::info!("{}: seed {seed}, {iterations} iterations", plan.label());
        let mut records = Vec::with_capacity(iterations);
        let mut failures = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            match simulate(plan, iteration_seed) {
                Ok(summary) => {
                    let millis = start_time.elapsed().as_secs_f64() * 1000.0;
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{iterations} passed in {millis:.2} ms: {}",
                            i + 1,
                            describe(&summary)
                        );
                    }
                    records.push(IterationRecord {
                        seed: iteration_seed,
                        millis,
                        summary,
                    });
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    log::warn!("{}: {message}", plan.label());
                    if self.verbose {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        log::info!("{}: {}/{iterations} passed", plan.label(), records.len());
        ScenarioResult {
            scenario_name: plan.label(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            iterations: records,
            failures,
        }
    }
}

fn describe(summary: &RunSummary) -> String {
    format!(
        "{} minigames, {} frames, won by {}",
        summary.minigames.len(),
        summary.frames,
        summary.winners.join("+")
    )
}

/// Run one session and check the engine's invariants along the way.
///
/// # Errors
///
/// Returns the first invariant violation or engine error.
pub fn simulate(plan: &SimPlan, seed: u64) -> Result<RunSummary> {
    log::debug!("session start: {} seed {seed}", plan.label());
    let summary = match plan.mode {
        SimMode::Rush => simulate_rush(plan.players, seed),
        SimMode::Board => simulate_board(plan, seed),
    }?;
    log::debug!("session end: seed {seed}, {}", describe(&summary));
    Ok(summary)
}

fn log_outcome(outcome: &MinigameOutcome, frames: usize) {
    log::debug!(
        "{} finished after {frames} frames: placements {:?}, crumbs {:?}",
        outcome.minigame,
        outcome.placements,
        outcome.crumbs
    );
}

fn bot_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed.rotate_left(17) ^ 0xB075)
}

/// Drive a running minigame with bots until it completes.
fn play_out<F>(
    run: &mut MinigameRun,
    team: &mut BotTeam,
    rng: &mut ChaCha20Rng,
    mut step: F,
) -> Result<(MinigameOutcome, usize)>
where
    F: FnMut(&mut MinigameRun, &InputState) -> Option<MinigameOutcome>,
{
    let mut input = InputState::new();
    for frame in 1..=FRAME_CAP {
        team.drive(run.game(), &mut input, rng);
        if let Some(outcome) = step(run, &input) {
            return Ok((outcome, frame));
        }
        input.end_frame();
    }
    bail!("{} did not finish within {FRAME_CAP} frames", run.kind())
}

/// Checks every completed minigame must pass.
fn check_outcome(
    outcome: &MinigameOutcome,
    roster: &Roster,
    crumbs_before: u32,
    wins_before: u32,
) -> Result<()> {
    let kind = outcome.minigame;
    let placed: BTreeSet<_> = outcome.placements.iter().flatten().copied().collect();
    let expected: BTreeSet<_> = roster.ids().into_iter().collect();
    ensure!(
        outcome.placements.len() == roster.player_count() && placed == expected,
        "{kind}: placements {:?} are not a permutation of the roster",
        outcome.placements
    );
    let awards = crumb_awards(roster.player_count());
    ensure!(
        outcome.crumbs == awards,
        "{kind}: awarded {:?}, expected {awards:?}",
        outcome.crumbs
    );
    let crumbs_after = total_crumbs(roster);
    let expected_crumbs = crumbs_before + awards.iter().sum::<u32>();
    ensure!(
        crumbs_after == expected_crumbs,
        "{kind}: roster holds {crumbs_after} crumbs, expected {expected_crumbs}"
    );
    ensure!(
        total_wins(roster) == wins_before + 1,
        "{kind}: expected exactly one new win"
    );
    Ok(())
}

fn total_crumbs(roster: &Roster) -> u32 {
    roster.players().iter().map(|p| p.crumbs).sum()
}

fn total_wins(roster: &Roster) -> u32 {
    roster.players().iter().map(|p| p.wins).sum()
}

fn simulate_rush(players: usize, seed: u64) -> Result<RunSummary> {
    let mut roster = Roster::new(players);
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut bots = bot_rng(seed);
    let mut sink = RecordingSink::new();
    let mut team = BotTeam::new(&roster.ids());
    let mut rush = RushController::with_catalog(&mut rng);

    let mut minigames = Vec::new();
    let mut frames = 0;
    while rush.has_next() {
        rush.announce_current(&mut sink);
        let mut run = rush
            .start_current(&roster, &mut rng, &mut sink)
            .ok_or_else(|| anyhow!("rush reported a next minigame but had none"))?;
        let crumbs_before = total_crumbs(&roster);
        let wins_before = total_wins(&roster);
        let (outcome, used) = play_out(&mut run, &mut team, &mut bots, |run, input| {
            run.update(DT, input, &mut rng, &mut roster, &mut sink)
        })?;
        check_outcome(&outcome, &roster, crumbs_before, wins_before)?;
        log_outcome(&outcome, used);

        let snapshot = roster.clone();
        ensure!(
            run.on_complete(&outcome.placements, &mut roster, &mut sink)
                .is_none()
                && roster == snapshot,
            "{}: completion applied twice",
            outcome.minigame
        );

        minigames.push(outcome.minigame);
        frames += used;
        rush.advance();
    }

    let names = rush.finish(&roster, &mut sink);
    let unique: BTreeSet<_> = minigames.iter().copied().collect();
    ensure!(
        unique.len() == minigames.len() && minigames.len() == MinigameKind::ALL.len(),
        "rush played {minigames:?}"
    );
    let expected: Vec<String> = winners(roster.players())
        .iter()
        .map(|p| p.name.clone())
        .collect();
    ensure!(names == expected, "victory named {names:?}, expected {expected:?}");
    ensure!(
        sink.last_screen() == Some(&Screen::Victory { winners: names.clone() }),
        "rush did not end on the victory screen"
    );
    let starts = sink.events_of("minigame_start").count();
    let ends = sink.events_of("minigame_end").count();
    ensure!(
        starts == minigames.len() && ends == minigames.len(),
        "recorded {starts} starts and {ends} ends for {} minigames",
        minigames.len()
    );

    Ok(RunSummary {
        minigames,
        frames,
        turns: 0,
        total_crumbs: total_crumbs(&roster),
        winners: names,
    })
}

fn simulate_board(plan: &SimPlan, seed: u64) -> Result<RunSummary> {
    let settings = Settings {
        player_count: plan.players,
        board: plan.board.clone(),
        ..Settings::default()
    };
    let fruit_price = settings.fruit_price;
    let mut session = BoardSession::with_seed(settings, seed)?;
    let mut chooser_rng = ChaCha20Rng::seed_from_u64(seed ^ 0x5EED);
    let mut bots = bot_rng(seed);
    let mut sink = RecordingSink::new();
    let mut team = BotTeam::new(&session.roster().ids());

    let mut ledger = 0u32;
    let mut fruit = 0u32;
    let mut minigames = Vec::new();
    let mut frames = 0;
    for _ in 0..plan.turns {
        let turn = session.take_turn(&mut RandomChoice::new(&mut chooser_rng), &mut sink)?;
        ensure!(
            turn.movement.path.len() == usize::try_from(turn.roll)?,
            "{} rolled {} but moved {} tiles",
            turn.player,
            turn.roll,
            turn.movement.path.len()
        );
        ensure!(
            turn.movement.landed() < session.board().len(),
            "{} landed off the board",
            turn.player
        );
        if turn.bought_fruit {
            ledger = ledger.saturating_sub(fruit_price);
            fruit += 1;
        }

        let crumbs_before = total_crumbs(session.roster());
        let wins_before = total_wins(session.roster());
        let Some(mut run) = session.start_pending_minigame(&mut sink) else {
            continue;
        };
        let (outcome, used) = play_out(&mut run, &mut team, &mut bots, |run, input| {
            session.play_frame(run, DT, input, &mut sink)
        })?;
        check_outcome(&outcome, session.roster(), crumbs_before, wins_before)?;
        log_outcome(&outcome, used);
        ledger += outcome.crumbs.iter().sum::<u32>();
        minigames.push(outcome.minigame);
        frames += used;
    }

    let total = total_crumbs(session.roster());
    ensure!(total == ledger, "roster holds {total} crumbs, ledger says {ledger}");
    let held: u32 = session.roster().players().iter().map(|p| p.fruit).sum();
    ensure!(held == fruit, "roster holds {held} fruit, {fruit} were bought");
    let turns = sink.events_of("player_turn").count();
    ensure!(turns == plan.turns, "recorded {turns} turns of {}", plan.turns);

    Ok(RunSummary {
        minigames,
        frames,
        turns,
        total_crumbs: total,
        winners: winners(session.roster().players())
            .iter()
            .map(|p| p.name.clone())
            .collect(),
    })
}
