#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Train Mania in a terminal.

mod audio;
mod commands;
mod config;
mod render;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use train_mania_core::{AudioNotifier, Event, SilentAudio};
use train_mania_scoreboard::{JsonFileScoreboard, DEFAULT_FILE_NAME};
use train_mania_system_round::{IntervalScheduler, RoundController};
use train_mania_world::{SeededRandom, World};

use crate::{
    audio::TerminalBell,
    commands::{LineCommand, HELP},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Build track against the clock, then watch the train run it.
#[derive(Debug, Parser)]
#[command(name = "train-mania", version, about)]
struct Args {
    /// Configuration file; defaults to ./train-mania.toml when present.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for tile draws, goal placement and conductor names.
    #[arg(long)]
    seed: Option<u64>,
    /// Stage to start on, counting from 1.
    #[arg(long, default_value_t = 1)]
    stage: usize,
    /// Leaderboard file; overrides the configured location.
    #[arg(long, value_name = "PATH")]
    leaderboard: Option<PathBuf>,
    /// Disable the terminal bell.
    #[arg(long)]
    mute: bool,
}

/// Entry point for the Train Mania command-line interface.
fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();
    run(args)
}

fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let settings = config::load(args.config.as_deref())?;
    let stage_count = settings.stages.len();
    let start_index = args
        .stage
        .checked_sub(1)
        .filter(|index| *index < stage_count)
        .with_context(|| {
            format!(
                "stage {} is not configured; choose 1 to {stage_count}",
                args.stage
            )
        })?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let leaderboard_path = args
        .leaderboard
        .or(settings.leaderboard)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));
    info!(seed, leaderboard = %leaderboard_path.display(), "starting Train Mania");

    let world = World::starting_at(
        settings.stages,
        start_index,
        settings.round.countdown_seconds(),
        Box::new(SeededRandom::new(seed)),
    )
    .context("failed to lay out the first stage")?;
    let audio: Box<dyn AudioNotifier> = if args.mute {
        Box::new(SilentAudio)
    } else {
        Box::new(TerminalBell)
    };
    let mut controller = RoundController::new(
        world,
        IntervalScheduler::new(),
        settings.round,
        Box::new(JsonFileScoreboard::new(leaderboard_path)),
        audio,
    );

    let mut stdout = io::stdout().lock();
    let mut events = Vec::new();
    write!(stdout, "{}", render::round(&controller.snapshot()))?;
    writeln!(stdout, "{HELP}")?;
    stdout.flush()?;

    let lines = spawn_stdin_reader();
    let mut last_tick = Instant::now();
    loop {
        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => Some(line),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let now = Instant::now();
        controller.advance(now.duration_since(last_tick), &mut events);
        last_tick = now;

        if let Some(line) = line {
            match commands::parse(&line) {
                Ok(LineCommand::Quit) => break,
                Ok(LineCommand::Help) => writeln!(stdout, "{HELP}")?,
                Ok(LineCommand::Scores) => {
                    write!(stdout, "{}", render::leaderboard(&controller.leaderboard()))?;
                }
                Ok(LineCommand::Board) => write!(stdout, "{}", render::round(&controller.snapshot()))?,
                Ok(command) => {
                    let stage_index = controller.snapshot().stage_index;
                    if let Some(input) = command.into_input(stage_index) {
                        controller.handle_input(input, &mut events);
                    }
                }
                Err(error) => writeln!(stdout, "{error}")?,
            }
        }

        if !events.is_empty() {
            present(&mut stdout, &controller, &events)?;
            events.clear();
        }
        stdout.flush()?;
    }

    info!("leaving Train Mania");
    Ok(())
}

fn present(
    out: &mut impl Write,
    controller: &RoundController<IntervalScheduler>,
    events: &[Event],
) -> Result<()> {
    if !render::needs_redraw(events) {
        if let Some(reminder) = render::countdown_reminder(events) {
            writeln!(out, "{reminder}")?;
        }
        return Ok(());
    }

    write!(out, "{}", render::round(&controller.snapshot()))?;
    for message in events.iter().filter_map(render::describe) {
        writeln!(out, "{message}")?;
    }
    if events
        .iter()
        .any(|event| matches!(event, Event::StageCompleted { .. }))
    {
        write!(out, "{}", render::leaderboard(&controller.leaderboard()))?;
        writeln!(out, "Type `next` for the next stage or `reset` to replay.")?;
    }
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    let _reader = thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    warn!(%error, "failed to read from stdin");
                    break;
                }
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}
