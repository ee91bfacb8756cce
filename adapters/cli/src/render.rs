//! Plain-text presentation of round snapshots and events.

use std::fmt::Write as _;

use train_mania_core::{
    CellCoord, Event, LeaderboardEntry, Phase, RoundSnapshot, Stage, TileKind, GAME_TITLE,
};
use train_mania_system_round::{completion_message, format_countdown};

/// Text shown when nobody has completed a stage yet.
pub(crate) const EMPTY_LEADERBOARD: &str = "No scores yet. Be the first engineer!";

/// Subtitle naming the grid size and the goal position in 1-based coordinates.
pub(crate) fn subtitle(stage: &Stage, goal: CellCoord) -> String {
    format!(
        "Grid: {size}x{size}. Connect START (top-left) to GOAL (row {}, col {}).",
        goal.row() + 1,
        goal.column() + 1,
        size = stage.size()
    )
}

/// Full board including the stage banner, grid and status line.
pub(crate) fn round(snapshot: &RoundSnapshot) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "== {GAME_TITLE} :: {} ==", snapshot.stage.title());
    let _ = writeln!(text, "{}", subtitle(&snapshot.stage, snapshot.goal));
    text.push_str(&grid(snapshot));
    let _ = writeln!(text, "{}", status(snapshot));
    text
}

/// Grid drawn row by row with 1-based column headers.
pub(crate) fn grid(snapshot: &RoundSnapshot) -> String {
    let view = snapshot.grid_view();
    let size = view.size();
    let show_train = snapshot.phase != Phase::Building;

    let mut text = String::from("    ");
    for column in 0..size {
        let _ = write!(text, "{:>2}", column + 1);
    }
    text.push('\n');

    for row in 0..size {
        let _ = write!(text, "{:>3} ", row + 1);
        for column in 0..size {
            let cell = CellCoord::new(row, column);
            let glyph = if show_train && snapshot.train.cell == cell {
                '@'
            } else if cell == view.start() {
                'S'
            } else if cell == view.goal() {
                'G'
            } else {
                view.tile_at(cell).map_or('.', tile_glyph)
            };
            let _ = write!(text, " {glyph}");
        }
        text.push('\n');
    }
    text
}

/// One-line summary of score against the stage target, timer, next tile and phase.
pub(crate) fn status(snapshot: &RoundSnapshot) -> String {
    let phase = if snapshot.can_depart() {
        "building, type `depart` to send the train"
    } else {
        match snapshot.phase {
            Phase::Won => "arrived",
            Phase::Stalled => "derailed, type `reset` to try again",
            Phase::Building | Phase::Departed => "train running",
        }
    };
    format!(
        "Score {}/{} | Time {} | Next {} {} | {phase}",
        snapshot.score,
        snapshot.stage.target_score(),
        format_countdown(snapshot.countdown),
        tile_glyph(snapshot.next_tile),
        snapshot.next_tile.name(),
    )
}

/// Ranked leaderboard, or the empty-board message.
pub(crate) fn leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return format!("{EMPTY_LEADERBOARD}\n");
    }
    let mut text = String::new();
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            text,
            "{:>2}. {} - {} pts (Stage {})",
            rank + 1,
            entry.name,
            entry.score,
            entry.stage.get()
        );
    }
    text
}

/// Message worth printing for the event, if any.
pub(crate) fn describe(event: &Event) -> Option<String> {
    match event {
        Event::PhaseChanged {
            phase: Phase::Departed,
        } => Some("All aboard! The train has left the station.".to_owned()),
        Event::TrainDerailed { at } => Some(format!(
            "The train derailed after row {}, col {}.",
            at.row() + 1,
            at.column() + 1
        )),
        Event::StageCompleted {
            stage,
            score,
            time_bonus,
            conductor,
        } => Some(format!(
            "{} Time bonus {time_bonus}. Recorded for {conductor}.",
            completion_message(*stage, *score)
        )),
        Event::StageStarted { .. }
        | Event::PlacementRejected { .. }
        | Event::TilePlaced { .. }
        | Event::CountdownChanged { .. }
        | Event::ScoreChanged { .. }
        | Event::PhaseChanged { .. }
        | Event::TrainAdvanced { .. } => None,
    }
}

/// Reports whether a batch changes anything beyond the countdown.
///
/// Refused placements leave the board as it was and stay silent.
pub(crate) fn needs_redraw(events: &[Event]) -> bool {
    events.iter().any(|event| {
        !matches!(
            event,
            Event::CountdownChanged { .. } | Event::PlacementRejected { .. }
        )
    })
}

/// Countdown reminder printed on round numbers and in the final seconds.
pub(crate) fn countdown_reminder(events: &[Event]) -> Option<String> {
    events.iter().rev().find_map(|event| match event {
        Event::CountdownChanged { remaining }
            if *remaining > 0 && (*remaining % 10 == 0 || *remaining <= 5) =>
        {
            Some(format!("Time left {}", format_countdown(*remaining)))
        }
        _ => None,
    })
}

fn tile_glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Horizontal => '─',
        TileKind::Vertical => '│',
        TileKind::TurnTopRight => '└',
        TileKind::TurnRightBottom => '┌',
        TileKind::TurnBottomLeft => '┐',
        TileKind::TurnLeftTop => '┘',
    }
}
