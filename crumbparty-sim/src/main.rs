mod bots;
mod reports;
mod runner;
mod seeds;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use crumbparty_game::board::layouts;
use crumbparty_game::{MAX_PLAYERS, MIN_PLAYERS};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use runner::{ScenarioResult, SimMode, SimPlan, Simulator};
use seeds::parse_seeds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "crumbparty-sim", version = "0.1.0")]
#[command(about = "Headless Crumb Party simulator: scripted bots play rushes and board rounds")]
struct Args {
    /// Number of players at the table
    #[arg(long, default_value_t = 4)]
    players: usize,

    /// Seeds to run: comma-separated values or ranges such as 10..20
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// What to simulate: a minigame rush or board turns
    #[arg(long, value_enum, default_value_t = SimMode::Rush)]
    mode: SimMode,

    /// Board to play in board mode
    #[arg(long, default_value = "meadow")]
    board: String,

    /// Player turns to take in board mode
    #[arg(long, default_value_t = 40)]
    turns: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List the built-in boards and exit
    #[arg(long)]
    list_boards: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_boards(&args)? {
        return Ok(());
    }

    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&args.players) {
        bail!(
            "--players must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {}",
            args.players
        );
    }
    let seeds = parse_seeds(&args.seeds)?;

    announce_banner();

    let start_time = Instant::now();
    let plan = plan_from_args(&args);
    let results = Simulator::new(args.verbose).run_plan(&plan, &seeds, args.iterations);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_boards(args: &Args) -> Result<bool> {
    if !args.list_boards {
        return Ok(false);
    }
    let mut out = open_output(args.output.as_deref())?;
    writeln!(out, "Available boards:")?;
    for name in layouts::names() {
        let board = layouts::builtin(name)?;
        writeln!(out, "  {name:12} - {} tiles", board.len())?;
    }
    out.flush().context("failed to flush board list")?;
    Ok(true)
}

/// Buffered report destination: the `--output` file, or stdout.
fn open_output(path: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    let inner: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(stdout()),
    };
    Ok(BufWriter::new(inner))
}

fn announce_banner() {
    println!("{}", "🎮 Crumb Party Simulator".bright_cyan().bold());
    println!("{}", "========================".cyan());
}

fn plan_from_args(args: &Args) -> SimPlan {
    SimPlan {
        mode: args.mode,
        players: args.players,
        board: args.board.clone(),
        turns: args.turns,
    }
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut out = open_output(args.output.as_deref())?;
    render_report(&mut out, args.report, results, start_time)?;
    out.flush().context("failed to flush report")?;
    Ok(())
}

fn render_report(
    out: &mut dyn Write,
    format: ReportFormat,
    results: &[ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    match (format, results.is_empty()) {
        (ReportFormat::Json, true) => writeln!(out, "[]")?,
        (ReportFormat::Json, false) => reports::generate_json_report(out, results)?,
        (ReportFormat::Markdown, true) => writeln!(
            out,
            "# Crumb Party Simulation Results\n\n_No scenarios executed._"
        )?,
        (ReportFormat::Markdown, false) => reports::generate_markdown_report(out, results)?,
        (ReportFormat::Console, true) => writeln!(out, "No scenarios executed.")?,
        (ReportFormat::Console, false) => {
            reports::generate_console_report(out, results, start_time.elapsed())?;
        }
    }

    // JSON output stays machine-readable.
    if format != ReportFormat::Json {
        writeln!(out)?;
        writeln!(out, "🏁 Total time: {:?}", start_time.elapsed())?;
    }
    Ok(())
}
