#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Train Mania engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters translate player input into
//! [`InputEvent`] values, the round controller turns those into [`Command`]
//! values, the world executes commands via its `apply` entry point, and then
//! broadcasts [`Event`] values that presentation layers and ports react to.
//! Systems only ever see the board through the read-only [`GridView`].

mod ports;

pub use ports::{
    rank_entries, AudioCue, AudioNotifier, CancellationToken, LeaderboardEntry, RandomSource,
    Scheduler, ScoreboardError, ScoreboardPort, SilentAudio, TimerFired, TimerKind,
    LEADERBOARD_CAPACITY,
};

use serde::{Deserialize, Serialize};

/// Title shown when the experience boots.
pub const GAME_TITLE: &str = "Train Mania";

/// Cell the train departs from on every stage.
pub const START_CELL: CellCoord = CellCoord::new(0, 0);

/// Stage table used when no configuration overrides it.
pub const DEFAULT_STAGES: [Stage; 3] = [
    Stage::new(StageId::new(1), 4, 800),
    Stage::new(StageId::new(2), 5, 1200),
    Stage::new(StageId::new(3), 6, 1600),
];

/// Lifecycle phase of a single round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Countdown is running and the player may place tiles.
    Building,
    /// The train has left the station and advances on every train tick.
    Departed,
    /// The train reached the goal station.
    Won,
    /// The train derailed; the round accepts no further scoring.
    Stalled,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Sets the countdown length used by every subsequent round reset.
    ConfigureCountdown {
        /// Seconds on the countdown when a round starts.
        seconds: u32,
    },
    /// Rebuilds the round for the stage at the provided index.
    ResetStage {
        /// Zero-based index into the configured stage table.
        stage: usize,
    },
    /// Rebuilds the round for the stage following the active one, wrapping around.
    AdvanceStage,
    /// Places the pending tile onto the provided cell.
    PlaceTile {
        /// Cell that should receive the pending tile.
        cell: CellCoord,
    },
    /// Consumes one second of the building countdown.
    CountdownTick,
    /// Sends the train on its way while keeping the remaining countdown.
    ///
    /// No player input maps here; scripted rounds use it to arrive with time
    /// on the clock and earn the time bonus.
    Depart,
    /// Zeroes the countdown and sends the train on its way immediately.
    ForceDepart,
    /// Applies the outcome of a single train step computed against the grid.
    MoveTrain {
        /// Result produced by the traversal system.
        outcome: StepOutcome,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a fresh round was laid out.
    StageStarted {
        /// Identifier of the stage that started.
        stage: StageId,
        /// Edge length of the square grid.
        size: u32,
        /// Cell hosting the goal station.
        goal: CellCoord,
        /// Tile the player will place next.
        next_tile: TileKind,
    },
    /// Confirms that a tile was placed onto the grid.
    TilePlaced {
        /// Cell that received the tile.
        cell: CellCoord,
        /// Kind of tile that was placed.
        kind: TileKind,
        /// Indicates whether the tile replaced an existing one.
        replaced: bool,
        /// Tile drawn to replace the one just placed.
        next_tile: TileKind,
    },
    /// Reports that a placement request was refused.
    PlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports the countdown value after it changed.
    CountdownChanged {
        /// Seconds left before the train departs on its own.
        remaining: u32,
    },
    /// Reports the score after it changed.
    ScoreChanged {
        /// Score accumulated in the active round.
        score: u32,
    },
    /// Announces that the round entered a new phase.
    PhaseChanged {
        /// Phase that became active after processing commands.
        phase: Phase,
    },
    /// Confirms that the train moved between two adjacent cells.
    TrainAdvanced {
        /// Cell the train occupied before moving.
        from: CellCoord,
        /// Cell the train occupies after moving.
        to: CellCoord,
        /// Side of `to` the train entered through.
        enter_from: Direction,
    },
    /// Reports that the train found no legal continuation.
    TrainDerailed {
        /// Cell the train was stuck on.
        at: CellCoord,
    },
    /// Announces that the train reached the goal station.
    StageCompleted {
        /// Identifier of the completed stage.
        stage: StageId,
        /// Final score including the arrival bonus.
        score: u32,
        /// Portion of the arrival bonus earned from the remaining countdown.
        time_bonus: u32,
        /// Name credited on the leaderboard.
        conductor: String,
    },
}

/// Discrete player intents delivered by an input adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// Player clicked the cell at the provided row and column.
    PlaceTile {
        /// Zero-based row of the clicked cell.
        row: u32,
        /// Zero-based column of the clicked cell.
        column: u32,
    },
    /// Player asked the train to leave before the countdown ends.
    ForceDepart,
    /// Player restarted the stage at the provided index.
    ResetStage {
        /// Zero-based index into the stage table.
        index: usize,
    },
    /// Player moved on to the next stage.
    AdvanceStage,
}

/// Grid-edge directions a track tile can connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Edge toward decreasing row indices.
    Top,
    /// Edge toward increasing column indices.
    Right,
    /// Edge toward increasing row indices.
    Bottom,
    /// Edge toward decreasing column indices.
    Left,
}

impl Direction {
    /// Every direction in clockwise order starting at the top edge.
    pub const ALL: [Direction; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Returns the edge facing this one across a cell boundary.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// Lower-case name used by presentation layers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Top => 0b0001,
            Self::Right => 0b0010,
            Self::Bottom => 0b0100,
            Self::Left => 0b1000,
        }
    }
}

/// Compact set of directions a cell currently connects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DirectionSet(u8);

impl DirectionSet {
    /// Set containing no directions.
    pub const EMPTY: Self = Self(0);

    /// Set containing every direction.
    pub const ALL: Self = Self(0b1111);

    /// Builds a set from an ordered pair of directions.
    #[must_use]
    pub const fn from_pair(pair: [Direction; 2]) -> Self {
        Self(pair[0].bit() | pair[1].bit())
    }

    /// Returns a copy of the set that also contains `direction`.
    #[must_use]
    pub const fn with(self, direction: Direction) -> Self {
        Self(self.0 | direction.bit())
    }

    /// Reports whether `direction` is part of the set.
    #[must_use]
    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    /// Number of directions in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Reports whether the set holds no directions.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the contained directions in clockwise order starting at the top.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

/// Track tiles the player can lay on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Straight track joining the left and right edges.
    Horizontal,
    /// Straight track joining the top and bottom edges.
    Vertical,
    /// Curve joining the top and right edges.
    TurnTopRight,
    /// Curve joining the right and bottom edges.
    TurnRightBottom,
    /// Curve joining the bottom and left edges.
    TurnBottomLeft,
    /// Curve joining the left and top edges.
    TurnLeftTop,
}

impl TileKind {
    /// Fixed catalog of tiles in draw order.
    pub const ALL: [TileKind; 6] = [
        Self::Horizontal,
        Self::Vertical,
        Self::TurnTopRight,
        Self::TurnRightBottom,
        Self::TurnBottomLeft,
        Self::TurnLeftTop,
    ];

    /// Short name of the tile.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::TurnTopRight => "turn-tr",
            Self::TurnRightBottom => "turn-rb",
            Self::TurnBottomLeft => "turn-bl",
            Self::TurnLeftTop => "turn-lt",
        }
    }

    /// Ordered pair of edges joined by the tile. The two entries always differ.
    #[must_use]
    pub const fn connections(self) -> [Direction; 2] {
        match self {
            Self::Horizontal => [Direction::Left, Direction::Right],
            Self::Vertical => [Direction::Top, Direction::Bottom],
            Self::TurnTopRight => [Direction::Top, Direction::Right],
            Self::TurnRightBottom => [Direction::Right, Direction::Bottom],
            Self::TurnBottomLeft => [Direction::Bottom, Direction::Left],
            Self::TurnLeftTop => [Direction::Left, Direction::Top],
        }
    }
}

/// Returns every tile kind in catalog order.
#[must_use]
pub const fn tile_catalog() -> &'static [TileKind] {
    &TileKind::ALL
}

/// Draws a tile uniformly from the catalog, consuming one value from `source`.
pub fn random_tile(source: &mut dyn RandomSource) -> TileKind {
    let catalog = tile_catalog();
    let bound = catalog.len() as u32;
    let index = source.next_below(bound) % bound;
    catalog[index as usize]
}

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Returns the adjacent cell across `direction` when it lies on a `size`×`size` grid.
    #[must_use]
    pub fn neighbor(self, direction: Direction, size: u32) -> Option<CellCoord> {
        let candidate = match direction {
            Direction::Top => self.row.checked_sub(1).map(|row| Self::new(row, self.column)),
            Direction::Right => self
                .column
                .checked_add(1)
                .map(|column| Self::new(self.row, column)),
            Direction::Bottom => self.row.checked_add(1).map(|row| Self::new(row, self.column)),
            Direction::Left => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(self.row, column)),
        };
        candidate.filter(|cell| cell.row < size && cell.column < size)
    }
}

/// Identifier of a stage as shown to players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(u32);

impl StageId {
    /// Creates a new stage identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Static description of one stage of the campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stage {
    id: StageId,
    size: u32,
    target_score: u32,
}

impl Stage {
    /// Creates a stage descriptor.
    #[must_use]
    pub const fn new(id: StageId, size: u32, target_score: u32) -> Self {
        Self {
            id,
            size,
            target_score,
        }
    }

    /// Identifier shown to players.
    #[must_use]
    pub const fn id(&self) -> StageId {
        self.id
    }

    /// Edge length of the square grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Score the stage is tuned around.
    #[must_use]
    pub const fn target_score(&self) -> u32 {
        self.target_score
    }

    /// Headline announcing the stage.
    #[must_use]
    pub fn title(&self) -> String {
        format!("Tutorial Round {}: Build the Line!", self.id.get())
    }
}

/// Result of advancing the train by a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The train moved into `to`, entering through `enter_from`.
    Advanced {
        /// Cell the train occupies after the step.
        to: CellCoord,
        /// Side of `to` the train entered through.
        enter_from: Direction,
    },
    /// No legal continuation exists from the current cell.
    Derailed,
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The round is no longer building, so placement is disabled.
    InvalidPhase,
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell hosts the start or goal station.
    Reserved,
}

/// Read-only view into the tile grid and its stations.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    tiles: &'a [Option<TileKind>],
    size: u32,
    goal: CellCoord,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided row-major tile slice.
    #[must_use]
    pub fn new(tiles: &'a [Option<TileKind>], size: u32, goal: CellCoord) -> Self {
        Self { tiles, size, goal }
    }

    /// Edge length of the square grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Cell hosting the start station.
    #[must_use]
    pub const fn start(&self) -> CellCoord {
        START_CELL
    }

    /// Cell hosting the goal station.
    #[must_use]
    pub const fn goal(&self) -> CellCoord {
        self.goal
    }

    /// Reports whether the cell lies on the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.size && cell.column() < self.size
    }

    /// Returns the tile placed on the provided cell, if any.
    #[must_use]
    pub fn tile_at(&self, cell: CellCoord) -> Option<TileKind> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.size).ok()?;
        self.tiles.get(row * width + column).copied().flatten()
    }
}

/// Immutable representation of the train used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainSnapshot {
    /// Cell currently occupied by the train.
    pub cell: CellCoord,
    /// Side of the current cell the train entered through.
    pub enter_from: Direction,
}

/// Read-only snapshot of everything a renderer needs after a mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// Stage being played.
    pub stage: Stage,
    /// Zero-based index of the stage within the stage table.
    pub stage_index: usize,
    /// Row-major tiles; `None` marks an empty cell.
    pub tiles: Vec<Option<TileKind>>,
    /// Cell hosting the goal station.
    pub goal: CellCoord,
    /// Tile the player will place next.
    pub next_tile: TileKind,
    /// Seconds left on the building countdown.
    pub countdown: u32,
    /// Score accumulated in the round.
    pub score: u32,
    /// Active lifecycle phase.
    pub phase: Phase,
    /// Current train position.
    pub train: TrainSnapshot,
}

impl RoundSnapshot {
    /// Returns a grid view backed by the snapshot's tiles.
    #[must_use]
    pub fn grid_view(&self) -> GridView<'_> {
        GridView::new(&self.tiles, self.stage.size(), self.goal)
    }

    /// Reports whether the player can still send the train early.
    #[must_use]
    pub fn can_depart(&self) -> bool {
        self.phase == Phase::Building
    }
}

#[cfg(test)]
mod tests {
    use super::{
        tile_catalog, CellCoord, Direction, DirectionSet, PlacementError, StageId, TileKind,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(3, 4);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn opposite_is_an_involution() {
        for direction in Direction::ALL {
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn catalog_tiles_connect_two_distinct_edges() {
        assert_eq!(
            tile_catalog(),
            &[
                TileKind::Horizontal,
                TileKind::Vertical,
                TileKind::TurnTopRight,
                TileKind::TurnRightBottom,
                TileKind::TurnBottomLeft,
                TileKind::TurnLeftTop,
            ]
        );
        for &kind in tile_catalog() {
            let [first, second] = kind.connections();
            assert_ne!(first, second, "{} joins an edge to itself", kind.name());
            assert_eq!(DirectionSet::from_pair(kind.connections()).len(), 2);
        }
    }

    #[test]
    fn catalog_covers_every_pair_of_edges() {
        let mut seen: Vec<DirectionSet> = TileKind::ALL
            .iter()
            .map(|kind| DirectionSet::from_pair(kind.connections()))
            .collect();
        seen.sort_by_key(|set| set.iter().map(|direction| direction as u8).collect::<Vec<_>>());
        seen.dedup();
        assert_eq!(seen.len(), 6, "every tile must cover a distinct pair");
    }

    #[test]
    fn neighbor_respects_grid_bounds() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.neighbor(Direction::Top, 4), None);
        assert_eq!(corner.neighbor(Direction::Left, 4), None);
        assert_eq!(
            corner.neighbor(Direction::Right, 4),
            Some(CellCoord::new(0, 1))
        );
        assert_eq!(
            corner.neighbor(Direction::Bottom, 4),
            Some(CellCoord::new(1, 0))
        );

        let far = CellCoord::new(3, 3);
        assert_eq!(far.neighbor(Direction::Right, 4), None);
        assert_eq!(far.neighbor(Direction::Bottom, 4), None);
    }

    #[test]
    fn direction_set_iterates_clockwise() {
        let set = DirectionSet::EMPTY
            .with(Direction::Left)
            .with(Direction::Top);
        let collected: Vec<Direction> = set.iter().collect();
        assert_eq!(collected, vec![Direction::Top, Direction::Left]);
        assert!(DirectionSet::EMPTY.is_empty());
        assert_eq!(DirectionSet::ALL.len(), 4);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::Reserved);
    }

    #[test]
    fn stage_id_round_trips_through_bincode() {
        assert_round_trip(&StageId::new(3));
    }
}
