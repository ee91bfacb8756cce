//! Virtual-clock scheduler that fires periodic timers in a deterministic order.

use std::time::Duration;

use train_mania_core::{CancellationToken, Scheduler, TimerFired, TimerKind};

const MIN_PERIOD: Duration = Duration::from_nanos(1);

#[derive(Clone, Copy, Debug)]
struct Timer {
    token: CancellationToken,
    kind: TimerKind,
    period: Duration,
    due: Duration,
}

/// Scheduler driven entirely by the time its owner feeds into it.
///
/// Timers due at the same instant fire in the order they were scheduled.
#[derive(Clone, Debug, Default)]
pub struct IntervalScheduler {
    now: Duration,
    next_token: u64,
    timers: Vec<Timer>,
}

impl IntervalScheduler {
    /// Creates a scheduler whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether the timer is still scheduled.
    #[must_use]
    pub fn is_scheduled(&self, token: CancellationToken) -> bool {
        self.timers.iter().any(|timer| timer.token == token)
    }

    /// Number of timers currently scheduled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for IntervalScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_repeating(&mut self, kind: TimerKind, period: Duration) -> CancellationToken {
        let token = CancellationToken::new(self.next_token);
        self.next_token += 1;
        let period = period.max(MIN_PERIOD);
        self.timers.push(Timer {
            token,
            kind,
            period,
            due: self.now.saturating_add(period),
        });
        token
    }

    fn cancel(&mut self, token: CancellationToken) {
        self.timers.retain(|timer| timer.token != token);
    }

    fn fire_next(&mut self, deadline: Duration) -> Option<TimerFired> {
        let next = self
            .timers
            .iter_mut()
            .filter(|timer| timer.due <= deadline)
            .min_by_key(|timer| (timer.due, timer.token));

        let Some(timer) = next else {
            self.now = self.now.max(deadline);
            return None;
        };

        let at = timer.due;
        timer.due = timer.due.saturating_add(timer.period);
        self.now = self.now.max(at);
        Some(TimerFired {
            token: timer.token,
            kind: timer.kind,
            at,
        })
    }
}
