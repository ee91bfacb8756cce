#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure traversal system that resolves track connectivity and steps the train.
//!
//! The train is a single token walking an undirected graph embedded in the
//! grid. Every placed tile contributes exactly one through-edge, while the
//! start and goal stations expose fixed connectivity. Nothing here is cached:
//! the board is read through a [`GridView`] on every call.

use train_mania_core::{CellCoord, Direction, DirectionSet, GridView, StepOutcome};

/// Exits tried from the start station, in preference order.
const START_EXITS: [Direction; 2] = [Direction::Right, Direction::Bottom];

/// Returns the directions the cell currently connects.
///
/// The start station always connects right and bottom, the goal station
/// accepts the train from every side, and any other cell exposes the two
/// connections of its placed tile or nothing when empty.
#[must_use]
pub fn connections_at(view: &GridView<'_>, cell: CellCoord) -> DirectionSet {
    if cell == view.start() {
        return DirectionSet::from_pair(START_EXITS);
    }
    if cell == view.goal() {
        return DirectionSet::ALL;
    }
    view.tile_at(cell)
        .map_or(DirectionSet::EMPTY, |kind| {
            DirectionSet::from_pair(kind.connections())
        })
}

/// Computes where the train goes after leaving `cell`, which it entered through `enter_from`.
///
/// The start station ignores `enter_from` and tries its exits right before
/// bottom. Every other cell must accept traffic from `enter_from` and sends
/// the train out through its other connection. Leaving the grid or running
/// into a cell that does not connect back derails the train.
#[must_use]
pub fn step(view: &GridView<'_>, cell: CellCoord, enter_from: Direction) -> StepOutcome {
    if cell == view.start() {
        return START_EXITS
            .into_iter()
            .find_map(|exit| enter_neighbor(view, cell, exit))
            .unwrap_or(StepOutcome::Derailed);
    }

    let Some(exit) = through_exit(connections_at(view, cell), enter_from) else {
        return StepOutcome::Derailed;
    };
    enter_neighbor(view, cell, exit).unwrap_or(StepOutcome::Derailed)
}

/// Returns the connection a through-tile sends the train out of.
///
/// `None` when the tile does not accept traffic from `enter_from` or has no
/// other connection to leave through.
#[must_use]
pub fn through_exit(exits: DirectionSet, enter_from: Direction) -> Option<Direction> {
    if !exits.contains(enter_from) {
        return None;
    }
    exits.iter().find(|exit| *exit != enter_from)
}

fn enter_neighbor(view: &GridView<'_>, cell: CellCoord, exit: Direction) -> Option<StepOutcome> {
    let neighbor = cell.neighbor(exit, view.size())?;
    let arrival = exit.opposite();
    if connections_at(view, neighbor).contains(arrival) {
        Some(StepOutcome::Advanced {
            to: neighbor,
            enter_from: arrival,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use train_mania_core::TileKind;

    #[test]
    fn through_exit_returns_other_connection() {
        for kind in TileKind::ALL {
            let exits = DirectionSet::from_pair(kind.connections());
            let [first, second] = kind.connections();
            assert_eq!(through_exit(exits, first), Some(second));
            assert_eq!(through_exit(exits, second), Some(first));
        }
    }

    #[test]
    fn through_exit_rejects_foreign_entry() {
        let exits = DirectionSet::from_pair(TileKind::Horizontal.connections());
        assert_eq!(through_exit(exits, Direction::Top), None);
        assert_eq!(through_exit(DirectionSet::EMPTY, Direction::Left), None);
    }
}
