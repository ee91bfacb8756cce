//! Capabilities the engine consumes from its surroundings.
//!
//! Each port is injected so that tests can substitute deterministic
//! implementations for randomness, time, storage and sound.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StageId;

/// Maximum number of entries retained on the leaderboard.
pub const LEADERBOARD_CAPACITY: usize = 8;

/// Seedable source of uniformly distributed integers.
pub trait RandomSource: fmt::Debug {
    /// Returns a value in `0..bound`. Callers never pass a zero bound.
    fn next_below(&mut self, bound: u32) -> u32;
}

/// Opaque handle identifying a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancellationToken(u64);

impl CancellationToken {
    /// Creates a token wrapping the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the token.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Periodic timers driven by the round controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-second building countdown.
    Countdown,
    /// Train movement cadence.
    Train,
}

/// Notification that a timer elapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerFired {
    /// Token returned when the timer was scheduled.
    pub token: CancellationToken,
    /// Kind supplied when the timer was scheduled.
    pub kind: TimerKind,
    /// Scheduler time at which the timer elapsed.
    pub at: Duration,
}

/// Clock and timer capability injected into the round controller.
pub trait Scheduler {
    /// Current scheduler time measured from its creation.
    fn now(&self) -> Duration;

    /// Schedules `kind` to fire every `period`, starting one period from now.
    fn schedule_repeating(&mut self, kind: TimerKind, period: Duration) -> CancellationToken;

    /// Cancels the timer. Cancelling an unknown or already cancelled token is a no-op.
    fn cancel(&mut self, token: CancellationToken);

    /// Fires the earliest timer due at or before `deadline`, advancing the clock to it.
    ///
    /// Returns `None` once nothing else is due, leaving the clock at `deadline`.
    fn fire_next(&mut self, deadline: Duration) -> Option<TimerFired>;
}

/// Fire-and-forget sound cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// A tile was placed.
    Click,
    /// The train left the station.
    Depart,
    /// The train reached the goal.
    Win,
}

/// Receives sound cues. Implementations must never affect game state.
pub trait AudioNotifier {
    /// Plays or records the cue.
    fn cue(&mut self, cue: AudioCue);
}

/// Audio notifier that discards every cue.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioNotifier for SilentAudio {
    fn cue(&mut self, _cue: AudioCue) {}
}

/// Single best-score record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Name credited with the score.
    pub name: String,
    /// Final score of the round.
    pub score: u32,
    /// Stage the score was achieved on.
    pub stage: StageId,
    /// Moment the round was completed.
    pub recorded_at: DateTime<Utc>,
}

/// Failures raised by leaderboard storage.
#[derive(Debug, Error)]
pub enum ScoreboardError {
    /// The storage medium could not be read or written.
    #[error("leaderboard storage failed: {0}")]
    Storage(#[from] std::io::Error),
    /// The stored records could not be decoded or encoded.
    #[error("leaderboard record is malformed: {0}")]
    Malformed(String),
}

/// Persistence boundary for best-score records.
pub trait ScoreboardPort {
    /// Records a new entry, keeping the board ranked and capped.
    fn append(&mut self, entry: LeaderboardEntry) -> Result<(), ScoreboardError>;

    /// Lists entries ordered by descending score, at most [`LEADERBOARD_CAPACITY`] long.
    fn list(&self) -> Result<Vec<LeaderboardEntry>, ScoreboardError>;
}

/// Orders entries by descending score and drops everything past the capacity.
///
/// Entries with equal scores keep their insertion order.
pub fn rank_entries(entries: &mut Vec<LeaderboardEntry>) {
    entries.sort_by(|left, right| right.score.cmp(&left.score));
    entries.truncate(LEADERBOARD_CAPACITY);
}
