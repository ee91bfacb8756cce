#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round lifecycle orchestration for Train Mania.
//!
//! The controller owns the world and the timers that drive it. Player input
//! and timer firings are translated into world commands, and the events the
//! world emits decide which timers run next. All timing flows through an
//! injected [`Scheduler`], so a round can be replayed on a virtual clock.

mod scheduler;

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use train_mania_core::{
    AudioCue, AudioNotifier, CancellationToken, CellCoord, Command, Event, InputEvent,
    LeaderboardEntry, Phase, RoundSnapshot, Scheduler, ScoreboardPort, StageId, TimerFired,
    TimerKind,
};
use train_mania_system_traversal as traversal;
use train_mania_world::{self as world, query, World, DEFAULT_COUNTDOWN_SECONDS};

pub use scheduler::IntervalScheduler;

/// Interval between countdown ticks while building.
pub const DEFAULT_COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Interval between train steps once departed.
pub const DEFAULT_TRAIN_INTERVAL: Duration = Duration::from_millis(1_300);

/// Configuration parameters required to construct the round controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    countdown_seconds: u32,
    countdown_period: Duration,
    train_interval: Duration,
}

impl Config {
    /// Creates a configuration using the provided countdown length and timer cadences.
    #[must_use]
    pub const fn new(
        countdown_seconds: u32,
        countdown_period: Duration,
        train_interval: Duration,
    ) -> Self {
        Self {
            countdown_seconds,
            countdown_period,
            train_interval,
        }
    }

    /// Seconds on the countdown when a round starts.
    #[must_use]
    pub const fn countdown_seconds(&self) -> u32 {
        self.countdown_seconds
    }

    /// Interval between countdown ticks.
    #[must_use]
    pub const fn countdown_period(&self) -> Duration {
        self.countdown_period
    }

    /// Interval between train steps.
    #[must_use]
    pub const fn train_interval(&self) -> Duration {
        self.train_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_COUNTDOWN_SECONDS,
            DEFAULT_COUNTDOWN_PERIOD,
            DEFAULT_TRAIN_INTERVAL,
        )
    }
}

/// Drives a round from building through departure to its terminal phase.
pub struct RoundController<S> {
    world: World,
    scheduler: S,
    config: Config,
    countdown_timer: Option<CancellationToken>,
    train_timer: Option<CancellationToken>,
    scoreboard: Box<dyn ScoreboardPort>,
    audio: Box<dyn AudioNotifier>,
}

impl<S: Scheduler> RoundController<S> {
    /// Takes ownership of the world and starts timing its current round.
    ///
    /// The configured countdown length applies from the next stage reset. Build
    /// the world with [`World::starting_at`] using the same length so the round
    /// already laid out starts with it too.
    pub fn new(
        mut world: World,
        scheduler: S,
        config: Config,
        scoreboard: Box<dyn ScoreboardPort>,
        audio: Box<dyn AudioNotifier>,
    ) -> Self {
        let mut ignored = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureCountdown {
                seconds: config.countdown_seconds,
            },
            &mut ignored,
        );

        let mut controller = Self {
            world,
            scheduler,
            config,
            countdown_timer: None,
            train_timer: None,
            scoreboard,
            audio,
        };
        match query::phase(&controller.world) {
            Phase::Building => controller.start_countdown(),
            Phase::Departed => controller.start_train(),
            Phase::Won | Phase::Stalled => {}
        }
        controller
    }

    /// Validates and applies a discrete player input.
    ///
    /// Inputs that make no sense in the current phase leave the round untouched.
    pub fn handle_input(&mut self, input: InputEvent, out_events: &mut Vec<Event>) {
        let command = match input {
            InputEvent::PlaceTile { row, column } => Command::PlaceTile {
                cell: CellCoord::new(row, column),
            },
            InputEvent::ForceDepart => Command::ForceDepart,
            InputEvent::ResetStage { index } => Command::ResetStage { stage: index },
            InputEvent::AdvanceStage => Command::AdvanceStage,
        };
        self.execute(command, out_events);
    }

    /// Advances the scheduler clock by `elapsed`, running every timer that falls due.
    pub fn advance(&mut self, elapsed: Duration, out_events: &mut Vec<Event>) {
        let deadline = self.scheduler.now().saturating_add(elapsed);
        while let Some(fired) = self.scheduler.fire_next(deadline) {
            self.on_timer(fired, out_events);
        }
    }

    /// Lists the leaderboard, falling back to an empty board when storage fails.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        match self.scoreboard.list() {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, "failed to read leaderboard");
                Vec::new()
            }
        }
    }

    /// Captures the state a renderer needs after a mutation.
    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        query::snapshot(&self.world)
    }

    /// Read-only access to the owned world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the injected scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Reports whether the building countdown is currently ticking.
    #[must_use]
    pub fn countdown_running(&self) -> bool {
        self.countdown_timer.is_some()
    }

    /// Reports whether the train ticker is currently running.
    #[must_use]
    pub fn train_running(&self) -> bool {
        self.train_timer.is_some()
    }

    fn on_timer(&mut self, fired: TimerFired, out_events: &mut Vec<Event>) {
        let active = match fired.kind {
            TimerKind::Countdown => self.countdown_timer,
            TimerKind::Train => self.train_timer,
        };
        if active != Some(fired.token) {
            debug!(token = fired.token.get(), "ignoring stale timer");
            return;
        }

        let command = match fired.kind {
            TimerKind::Countdown => Command::CountdownTick,
            TimerKind::Train => {
                let train = query::train(&self.world);
                let outcome =
                    traversal::step(&query::grid_view(&self.world), train.cell, train.enter_from);
                Command::MoveTrain { outcome }
            }
        };
        self.execute(command, out_events);
    }

    fn execute(&mut self, command: Command, out_events: &mut Vec<Event>) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        for event in &events {
            self.react(event);
        }
        out_events.extend(events);
    }

    fn react(&mut self, event: &Event) {
        match event {
            Event::StageStarted {
                stage, size, goal, ..
            } => {
                self.stop_timers();
                info!(
                    stage = stage.get(),
                    size,
                    goal_row = goal.row(),
                    goal_column = goal.column(),
                    "stage started"
                );
                self.start_countdown();
            }
            Event::TilePlaced { .. } => self.audio.cue(AudioCue::Click),
            Event::PhaseChanged { phase } => match phase {
                Phase::Building => {}
                Phase::Departed => {
                    self.cancel_countdown();
                    info!("train departed");
                    self.audio.cue(AudioCue::Depart);
                    self.start_train();
                }
                Phase::Won => self.cancel_train(),
                Phase::Stalled => {
                    self.cancel_train();
                    info!("train derailed, round stalled");
                }
            },
            Event::StageCompleted {
                stage,
                score,
                time_bonus,
                conductor,
            } => {
                info!(stage = stage.get(), score, time_bonus, "stage completed");
                self.audio.cue(AudioCue::Win);
                let entry = LeaderboardEntry {
                    name: conductor.clone(),
                    score: *score,
                    stage: *stage,
                    recorded_at: Utc::now(),
                };
                if let Err(error) = self.scoreboard.append(entry) {
                    warn!(%error, "failed to persist leaderboard entry");
                }
            }
            Event::PlacementRejected { cell, reason } => {
                debug!(row = cell.row(), column = cell.column(), ?reason, "placement refused");
            }
            Event::CountdownChanged { .. }
            | Event::ScoreChanged { .. }
            | Event::TrainAdvanced { .. }
            | Event::TrainDerailed { .. } => {}
        }
    }

    fn start_countdown(&mut self) {
        self.cancel_countdown();
        self.countdown_timer = Some(
            self.scheduler
                .schedule_repeating(TimerKind::Countdown, self.config.countdown_period),
        );
    }

    fn start_train(&mut self) {
        self.cancel_train();
        self.train_timer = Some(
            self.scheduler
                .schedule_repeating(TimerKind::Train, self.config.train_interval),
        );
    }

    fn cancel_countdown(&mut self) {
        if let Some(token) = self.countdown_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    fn cancel_train(&mut self) {
        if let Some(token) = self.train_timer.take() {
            self.scheduler.cancel(token);
        }
    }

    fn stop_timers(&mut self) {
        self.cancel_countdown();
        self.cancel_train();
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for RoundController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundController")
            .field("world", &self.world)
            .field("scheduler", &self.scheduler)
            .field("config", &self.config)
            .field("countdown_timer", &self.countdown_timer)
            .field("train_timer", &self.train_timer)
            .finish_non_exhaustive()
    }
}

/// Formats a countdown as `mm:ss`.
#[must_use]
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Message shown when the train reaches the goal.
#[must_use]
pub fn completion_message(stage: StageId, score: u32) -> String {
    format!(
        "Stage {} complete! Score {score}. Ready for the next route?",
        stage.get()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_formats_minutes_and_seconds() {
        assert_eq!(format_countdown(60), "01:00");
        assert_eq!(format_countdown(45), "00:45");
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(125), "02:05");
    }

    #[test]
    fn completion_message_names_stage_and_score() {
        assert_eq!(
            completion_message(StageId::new(2), 680),
            "Stage 2 complete! Score 680. Ready for the next route?"
        );
    }

    #[test]
    fn default_config_matches_round_cadence() {
        let config = Config::default();
        assert_eq!(config.countdown_seconds(), 60);
        assert_eq!(config.countdown_period(), Duration::from_secs(1));
        assert_eq!(config.train_interval(), Duration::from_millis(1_300));
    }
}
