// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

/// Identifies a timer registered on a [`crate::Catalyst`]. Scoped to that
/// catalyst only — unlike an entity id, a timer carries no name, context, or
/// service semantics, so it isn't a ledger entity the way
/// `original_source/TaskTonic/ttTimer.py`'s `ttTimer(ttEssence)` is; the
/// catalyst tracks it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub(crate) u64);

/// Which reload policy a timer uses once its deadline passes (spec.md
/// §4.3). `SingleShot` finishes on fire. `Repeating` re-arms from its
/// *previous* deadline plus one period, so it never drifts against wall
/// clock even if the catalyst was busy when it expired. `Pausing` re-arms
/// from the fire time instead, and additionally supports
/// [`crate::Catalyst::pause_timer`] / [`crate::Catalyst::resume_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    SingleShot,
    Repeating,
    Pausing,
}

/// What a timer should do next after its callback has run. Returned by the
/// catalyst's internal expiry step; mirrors spec.md §9's "service all
/// already-expired timers in deadline order, then return the wait until the
/// next unexpired deadline" resolution of the `check_on_expiration` Open
/// Question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Reschedule(Instant),
    Stop,
}

pub(crate) type TimerCallback = Box<dyn FnMut() + Send>;

pub(crate) struct TimerSlot {
    pub id: TimerId,
    pub kind: TimerKind,
    pub period: Duration,
    /// `Some` while actively scheduled; `None` while stopped, finished (for
    /// a fired single-shot), or paused.
    pub deadline: Option<Instant>,
    /// Time left when paused; restored into `deadline` on resume.
    pub remaining: Option<Duration>,
    pub callback: TimerCallback,
}

impl TimerSlot {
    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Applies this slot's reload policy once its deadline has passed.
    /// `fired_deadline` is the deadline that just expired; `now` is the
    /// instant the catalyst observed the expiry.
    pub(crate) fn on_expire(&mut self, fired_deadline: Instant, now: Instant) -> TimerAction {
        match self.kind {
            TimerKind::SingleShot => {
                self.deadline = None;
                TimerAction::Stop
            }
            TimerKind::Repeating => {
                let mut next = fired_deadline + self.period;
                while next <= now {
                    next += self.period;
                }
                self.deadline = Some(next);
                TimerAction::Reschedule(next)
            }
            TimerKind::Pausing => {
                let next = now + self.period;
                self.deadline = Some(next);
                TimerAction::Reschedule(next)
            }
        }
    }
}
