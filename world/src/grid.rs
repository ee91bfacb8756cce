//! Tile grid owned by a single round.

use thiserror::Error;
use train_mania_core::{CellCoord, GridView, PlacementError, RandomSource, TileKind, START_CELL};

/// Number of random draws spent looking for a distant goal.
const GOAL_ATTEMPTS: usize = 50;

/// Errors raised when a grid cannot be laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Grids need room for both a start and a goal station.
    #[error("grid size {0} is too small; at least 2x2 is required")]
    InvalidSize(u32),
    /// The goal must lie on the grid and differ from the start station.
    #[error("goal at row {row}, column {column} is not a valid station cell")]
    InvalidGoal {
        /// Row of the rejected goal.
        row: u32,
        /// Column of the rejected goal.
        column: u32,
    },
}

/// Square board of optional tile placements with fixed stations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: u32,
    goal: CellCoord,
    tiles: Vec<Option<TileKind>>,
}

impl Grid {
    /// Creates an empty `size`×`size` grid with the goal station at `goal`.
    pub fn new(size: u32, goal: CellCoord) -> Result<Self, GridError> {
        if size < 2 {
            return Err(GridError::InvalidSize(size));
        }
        if goal == START_CELL || goal.row() >= size || goal.column() >= size {
            return Err(GridError::InvalidGoal {
                row: goal.row(),
                column: goal.column(),
            });
        }

        let capacity = usize::try_from(u64::from(size) * u64::from(size))
            .map_err(|_| GridError::InvalidSize(size))?;
        Ok(Self {
            size,
            goal,
            tiles: vec![None; capacity],
        })
    }

    /// Edge length of the grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Cell hosting the goal station.
    #[must_use]
    pub const fn goal(&self) -> CellCoord {
        self.goal
    }

    /// Reports whether the cell hosts the start station.
    #[must_use]
    pub fn is_start(&self, cell: CellCoord) -> bool {
        cell == START_CELL
    }

    /// Reports whether the cell hosts the goal station.
    #[must_use]
    pub fn is_goal(&self, cell: CellCoord) -> bool {
        cell == self.goal
    }

    /// Returns the tile placed on the cell, if any.
    #[must_use]
    pub fn tile_at(&self, cell: CellCoord) -> Option<TileKind> {
        self.view().tile_at(cell)
    }

    /// Places `kind` on the cell, reporting whether it replaced an existing tile.
    ///
    /// Station cells and cells outside the grid are refused without mutation.
    pub fn place(&mut self, cell: CellCoord, kind: TileKind) -> Result<bool, PlacementError> {
        if self.is_start(cell) || self.is_goal(cell) {
            return Err(PlacementError::Reserved);
        }
        let index = self.index(cell).ok_or(PlacementError::OutOfBounds)?;
        let slot = self
            .tiles
            .get_mut(index)
            .ok_or(PlacementError::OutOfBounds)?;
        Ok(slot.replace(kind).is_some())
    }

    /// Captures a read-only view of the grid.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.tiles, self.size, self.goal)
    }

    /// Row-major tile storage.
    #[must_use]
    pub fn tiles(&self) -> &[Option<TileKind>] {
        &self.tiles
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.row() < self.size && cell.column() < self.size {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.size).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Smallest Manhattan distance between start and goal a layout aims for.
#[must_use]
pub const fn minimum_goal_distance(size: u32) -> u32 {
    let scaled = size.saturating_mul(6) / 5;
    if scaled > 3 {
        scaled
    } else {
        3
    }
}

/// Chooses the goal station for a `size`×`size` grid.
///
/// Up to fifty row/column draws look for a cell at least
/// [`minimum_goal_distance`] away from the start. When none qualifies the goal
/// falls back to a uniform draw over every non-start cell. `size` must be at
/// least 2, as enforced by [`Grid::new`].
pub fn pick_goal(size: u32, random: &mut dyn RandomSource) -> CellCoord {
    let minimum = minimum_goal_distance(size);
    for _ in 0..GOAL_ATTEMPTS {
        let row = random.next_below(size) % size;
        let column = random.next_below(size) % size;
        let candidate = CellCoord::new(row, column);
        if candidate != START_CELL && candidate.manhattan_distance(START_CELL) >= minimum {
            return candidate;
        }
    }

    let cells = size.saturating_mul(size);
    let offset = 1 + random.next_below(cells - 1) % (cells - 1);
    CellCoord::new(offset / size, offset % size)
}
