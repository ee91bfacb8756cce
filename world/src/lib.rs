#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative round state management for Train Mania.

pub mod grid;
pub mod random;

use thiserror::Error;
use train_mania_core::{
    random_tile, CellCoord, Command, Direction, Event, Phase, PlacementError, RandomSource, Stage,
    StepOutcome, TileKind, START_CELL,
};

pub use grid::{Grid, GridError};
pub use random::{ScriptedRandom, SeededRandom};

/// Seconds on the building countdown when a round starts.
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 60;

const PLACEMENT_POINTS: u32 = 20;
const REPLACEMENT_POINTS: u32 = 4;
const REPLACEMENT_SCORE_PENALTY: u32 = 10;
const REPLACEMENT_TIME_PENALTY: u32 = 10;
const STEP_POINTS: u32 = 35;
const ARRIVAL_BONUS: u32 = 200;
const TIME_BONUS_PER_SECOND: u32 = 5;

const CONDUCTOR_NUMBER_BASE: u32 = 10;
const CONDUCTOR_NUMBER_SPAN: u32 = 90;

/// Side the train is considered to have entered the start station through.
const START_ENTER_FROM: Direction = Direction::Left;

/// Errors raised when the world cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// At least one stage is required.
    #[error("no stages were configured")]
    NoStages,
    /// A configured stage cannot host a grid.
    #[error("stage {stage} cannot be laid out: {source}")]
    InvalidStage {
        /// Identifier of the offending stage.
        stage: u32,
        /// Underlying grid failure.
        #[source]
        source: GridError,
    },
    /// The requested starting stage is outside the stage table.
    #[error("stage index {index} is out of range for {count} stages")]
    UnknownStage {
        /// Requested zero-based stage index.
        index: usize,
        /// Number of configured stages.
        count: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Train {
    cell: CellCoord,
    enter_from: Direction,
}

impl Train {
    const fn at_start() -> Self {
        Self {
            cell: START_CELL,
            enter_from: START_ENTER_FROM,
        }
    }
}

/// Represents the authoritative Train Mania round state.
#[derive(Debug)]
pub struct World {
    stages: Vec<Stage>,
    stage_index: usize,
    countdown_seconds: u32,
    grid: Grid,
    next_tile: TileKind,
    countdown: u32,
    score: u32,
    phase: Phase,
    train: Train,
    random: Box<dyn RandomSource>,
}

impl World {
    /// Creates a world positioned at the first stage, ready for building.
    pub fn new(stages: Vec<Stage>, random: Box<dyn RandomSource>) -> Result<Self, WorldError> {
        Self::starting_at(stages, 0, DEFAULT_COUNTDOWN_SECONDS, random)
    }

    /// Creates a world positioned at `stage_index` whose rounds start with
    /// `countdown_seconds` on the clock, including the first one.
    pub fn starting_at(
        stages: Vec<Stage>,
        stage_index: usize,
        countdown_seconds: u32,
        random: Box<dyn RandomSource>,
    ) -> Result<Self, WorldError> {
        if stages.is_empty() {
            return Err(WorldError::NoStages);
        }
        let Some(first) = stages.get(stage_index).copied() else {
            return Err(WorldError::UnknownStage {
                index: stage_index,
                count: stages.len(),
            });
        };
        for stage in &stages {
            if stage.size() < 2 {
                return Err(WorldError::InvalidStage {
                    stage: stage.id().get(),
                    source: GridError::InvalidSize(stage.size()),
                });
            }
        }

        let mut random = random;
        let next_tile = random_tile(random.as_mut());
        let goal = grid::pick_goal(first.size(), random.as_mut());
        let grid = Grid::new(first.size(), goal).map_err(|source| WorldError::InvalidStage {
            stage: first.id().get(),
            source,
        })?;

        Ok(Self {
            stages,
            stage_index,
            countdown_seconds,
            grid,
            next_tile,
            countdown: countdown_seconds,
            score: 0,
            phase: Phase::Building,
            train: Train::at_start(),
            random,
        })
    }

    fn reset_round(&mut self, stage_index: usize, out_events: &mut Vec<Event>) {
        let Some(stage) = self.stages.get(stage_index).copied() else {
            return;
        };

        let next_tile = random_tile(self.random.as_mut());
        let goal = grid::pick_goal(stage.size(), self.random.as_mut());
        let Ok(grid) = Grid::new(stage.size(), goal) else {
            return;
        };

        self.stage_index = stage_index;
        self.grid = grid;
        self.next_tile = next_tile;
        self.countdown = self.countdown_seconds;
        self.score = 0;
        self.phase = Phase::Building;
        self.train = Train::at_start();

        out_events.push(Event::StageStarted {
            stage: stage.id(),
            size: stage.size(),
            goal,
            next_tile,
        });
        out_events.push(Event::CountdownChanged {
            remaining: self.countdown,
        });
        out_events.push(Event::ScoreChanged { score: self.score });
        out_events.push(Event::PhaseChanged {
            phase: Phase::Building,
        });
    }

    fn place_tile(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Building {
            out_events.push(Event::PlacementRejected {
                cell,
                reason: PlacementError::InvalidPhase,
            });
            return;
        }

        let kind = self.next_tile;
        let replaced = match self.grid.place(cell, kind) {
            Ok(replaced) => replaced,
            Err(reason) => {
                out_events.push(Event::PlacementRejected { cell, reason });
                return;
            }
        };

        self.next_tile = random_tile(self.random.as_mut());
        self.score = self.score.saturating_add(if replaced {
            REPLACEMENT_POINTS
        } else {
            PLACEMENT_POINTS
        });
        out_events.push(Event::TilePlaced {
            cell,
            kind,
            replaced,
            next_tile: self.next_tile,
        });

        if replaced {
            self.apply_countdown_penalty(REPLACEMENT_TIME_PENALTY, out_events);
            self.score = self.score.saturating_sub(REPLACEMENT_SCORE_PENALTY);
        }
        out_events.push(Event::ScoreChanged { score: self.score });
    }

    fn apply_countdown_penalty(&mut self, seconds: u32, out_events: &mut Vec<Event>) {
        if self.countdown == 0 {
            return;
        }
        self.countdown = self.countdown.saturating_sub(seconds);
        out_events.push(Event::CountdownChanged {
            remaining: self.countdown,
        });
        if self.countdown == 0 {
            self.depart(out_events);
        }
    }

    fn countdown_tick(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Building {
            return;
        }
        if self.countdown == 0 {
            self.depart(out_events);
            return;
        }

        self.countdown -= 1;
        out_events.push(Event::CountdownChanged {
            remaining: self.countdown,
        });
        if self.countdown == 0 {
            self.depart(out_events);
        }
    }

    fn force_depart(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Building {
            return;
        }
        if self.countdown != 0 {
            self.countdown = 0;
            out_events.push(Event::CountdownChanged { remaining: 0 });
        }
        self.depart(out_events);
    }

    fn depart(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Building {
            return;
        }
        self.phase = Phase::Departed;
        out_events.push(Event::PhaseChanged {
            phase: Phase::Departed,
        });
    }

    fn move_train(&mut self, outcome: StepOutcome, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Departed {
            return;
        }

        let (to, enter_from) = match outcome {
            StepOutcome::Advanced { to, enter_from } => (to, enter_from),
            StepOutcome::Derailed => {
                self.phase = Phase::Stalled;
                out_events.push(Event::TrainDerailed {
                    at: self.train.cell,
                });
                out_events.push(Event::PhaseChanged {
                    phase: Phase::Stalled,
                });
                return;
            }
        };

        let from = self.train.cell;
        if from.neighbor(enter_from.opposite(), self.grid.size()) != Some(to) {
            return;
        }

        self.train = Train { cell: to, enter_from };
        self.score = self.score.saturating_add(STEP_POINTS);
        out_events.push(Event::TrainAdvanced {
            from,
            to,
            enter_from,
        });

        if !self.grid.is_goal(to) {
            out_events.push(Event::ScoreChanged { score: self.score });
            return;
        }

        let time_bonus = self.countdown.saturating_mul(TIME_BONUS_PER_SECOND);
        self.score = self
            .score
            .saturating_add(ARRIVAL_BONUS)
            .saturating_add(time_bonus);
        self.phase = Phase::Won;
        let conductor = format!(
            "Conductor {}",
            CONDUCTOR_NUMBER_BASE + self.random.next_below(CONDUCTOR_NUMBER_SPAN)
        );
        out_events.push(Event::ScoreChanged { score: self.score });
        out_events.push(Event::PhaseChanged { phase: Phase::Won });
        out_events.push(Event::StageCompleted {
            stage: self.stage().id(),
            score: self.score,
            time_bonus,
            conductor,
        });
    }

    fn stage(&self) -> Stage {
        self.stages[self.stage_index]
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureCountdown { seconds } => {
            world.countdown_seconds = seconds;
        }
        Command::ResetStage { stage } => world.reset_round(stage, out_events),
        Command::AdvanceStage => {
            let next = (world.stage_index + 1) % world.stages.len();
            world.reset_round(next, out_events);
        }
        Command::PlaceTile { cell } => world.place_tile(cell, out_events),
        Command::CountdownTick => world.countdown_tick(out_events),
        Command::Depart => world.depart(out_events),
        Command::ForceDepart => world.force_depart(out_events),
        Command::MoveTrain { outcome } => world.move_train(outcome, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use train_mania_core::{
        CellCoord, GridView, Phase, RoundSnapshot, Stage, TileKind, TrainSnapshot,
    };

    /// Stage currently being played.
    #[must_use]
    pub fn stage(world: &World) -> Stage {
        world.stage()
    }

    /// Zero-based index of the active stage.
    #[must_use]
    pub fn stage_index(world: &World) -> usize {
        world.stage_index
    }

    /// Active lifecycle phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Score accumulated in the active round.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Seconds left on the building countdown.
    #[must_use]
    pub fn countdown(world: &World) -> u32 {
        world.countdown
    }

    /// Tile the player will place next.
    #[must_use]
    pub fn next_tile(world: &World) -> TileKind {
        world.next_tile
    }

    /// Cell hosting the goal station.
    #[must_use]
    pub fn goal(world: &World) -> CellCoord {
        world.grid.goal()
    }

    /// Current train position.
    #[must_use]
    pub fn train(world: &World) -> TrainSnapshot {
        TrainSnapshot {
            cell: world.train.cell,
            enter_from: world.train.enter_from,
        }
    }

    /// Exposes a read-only view of the tile grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Captures everything a renderer needs in a single owned value.
    #[must_use]
    pub fn snapshot(world: &World) -> RoundSnapshot {
        RoundSnapshot {
            stage: world.stage(),
            stage_index: world.stage_index,
            tiles: world.grid.tiles().to_vec(),
            goal: world.grid.goal(),
            next_tile: world.next_tile,
            countdown: world.countdown,
            score: world.score,
            phase: world.phase,
            train: train(world),
        }
    }
}
