//! Line-oriented player commands read from standard input.

use thiserror::Error;
use train_mania_core::InputEvent;

/// Usage summary printed on request or after a parse failure.
pub(crate) const HELP: &str = "\
commands:
  place R C   lay the next tile at row R, column C (1-based)
  depart      send the train before the countdown expires
  reset       restart the current stage
  next        move on to the next stage
  board       redraw the board
  scores      show the leaderboard
  help        show this message
  quit        leave the game";

/// Single player command entered on the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LineCommand {
    /// Places the next tile on a zero-based cell.
    Place {
        /// Zero-based row.
        row: u32,
        /// Zero-based column.
        column: u32,
    },
    /// Sends the train early.
    Depart,
    /// Restarts the active stage.
    Reset,
    /// Advances to the following stage.
    Next,
    /// Redraws the board.
    Board,
    /// Lists the leaderboard.
    Scores,
    /// Prints usage.
    Help,
    /// Ends the session.
    Quit,
}

impl LineCommand {
    /// Translates the command into round input, given the active stage index.
    ///
    /// Commands that only affect the terminal return `None`.
    pub(crate) fn into_input(self, stage_index: usize) -> Option<InputEvent> {
        match self {
            Self::Place { row, column } => Some(InputEvent::PlaceTile { row, column }),
            Self::Depart => Some(InputEvent::ForceDepart),
            Self::Reset => Some(InputEvent::ResetStage { index: stage_index }),
            Self::Next => Some(InputEvent::AdvanceStage),
            Self::Board | Self::Scores | Self::Help | Self::Quit => None,
        }
    }
}

/// Errors raised while parsing a command line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum CommandParseError {
    /// The line contained only whitespace.
    #[error("enter a command, or `help` for the list")]
    Empty,
    /// The verb is not recognised.
    #[error("unknown command `{0}`, try `help`")]
    UnknownCommand(String),
    /// `place` was not followed by exactly two coordinates.
    #[error("usage: place ROW COLUMN")]
    MissingCoordinates,
    /// A coordinate was not a positive integer.
    #[error("`{0}` is not a row or column number (counting starts at 1)")]
    InvalidCoordinate(String),
    /// The command does not take arguments.
    #[error("`{0}` takes no arguments")]
    UnexpectedArguments(String),
}

/// Parses one line of terminal input.
pub(crate) fn parse(line: &str) -> Result<LineCommand, CommandParseError> {
    let mut words = line.split_whitespace();
    let verb = words
        .next()
        .ok_or(CommandParseError::Empty)?
        .to_ascii_lowercase();

    if matches!(verb.as_str(), "place" | "p") {
        let row = words.next().ok_or(CommandParseError::MissingCoordinates)?;
        let column = words.next().ok_or(CommandParseError::MissingCoordinates)?;
        if words.next().is_some() {
            return Err(CommandParseError::MissingCoordinates);
        }
        return Ok(LineCommand::Place {
            row: parse_coordinate(row)?,
            column: parse_coordinate(column)?,
        });
    }

    let command = match verb.as_str() {
        "depart" | "go" => LineCommand::Depart,
        "reset" | "r" => LineCommand::Reset,
        "next" | "n" => LineCommand::Next,
        "board" | "b" => LineCommand::Board,
        "scores" | "s" => LineCommand::Scores,
        "help" | "h" | "?" => LineCommand::Help,
        "quit" | "q" | "exit" => LineCommand::Quit,
        _ => return Err(CommandParseError::UnknownCommand(verb)),
    };
    if words.next().is_some() {
        return Err(CommandParseError::UnexpectedArguments(verb));
    }
    Ok(command)
}

fn parse_coordinate(value: &str) -> Result<u32, CommandParseError> {
    value
        .parse::<u32>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .ok_or_else(|| CommandParseError::InvalidCoordinate(value.to_owned()))
}
