// SPDX-License-Identifier: MIT

use crate::clock::{Clock, SystemClock};
use crate::error::CatalystError;
use crate::timer::{TimerAction, TimerId, TimerKind, TimerSlot};
use parking_lot::Mutex;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tasktonic_ledger::EntityId;

/// A single queued or extra-sparkle unit of work: a type-erased, owned
/// closure the catalyst runs to completion on its own thread. The
/// `tasktonic-tonic` crate builds these by closing over the concrete
/// tonic/handler/args triple (spec.md §4.3's "(tonic, handler, args)" job
/// shape) so that this crate never needs to depend on it.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// How long [`Catalyst::loop_body_once`] blocks on an empty queue when no
/// timer is scheduled (spec.md §4.3, "a bounded idle default, e.g. 60s").
pub const IDLE_WAIT: Duration = Duration::from_secs(60);

/// Outcome of one [`Catalyst::loop_body_once`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStep {
    /// The loop should keep running.
    Continue,
    /// The attached-tonic set became empty (or the queue was torn down);
    /// the caller should stop driving this catalyst.
    Finished,
}

struct CatalystState {
    tonics: Vec<EntityId>,
    timers: Vec<TimerSlot>,
    next_timer_id: u64,
    running: bool,
}

/// A single-consumer work executor: pulls `(tonic, handler, args)` jobs off
/// a FIFO queue and runs them to completion on one owning thread, drives a
/// sorted timer wheel between dequeues, and owns the lifecycle of the
/// tonics attached to it (spec.md §4.3).
///
/// Catalyst id 0 runs its loop on the main thread; every other catalyst
/// owns a dedicated worker thread ([`Catalyst::spawn_worker`]). All mutable
/// state is behind `parking_lot::Mutex` rather than confined with
/// `RefCell`, since `bind_tonic`/`remove_tonic`/timer control and the
/// cross-thread `sender` must all be callable from any thread, not just the
/// owning one — only [`Catalyst::run`]'s dequeue-execute step assumes it is
/// the sole caller draining the queue.
pub struct Catalyst<C: Clock = SystemClock> {
    id: EntityId,
    clock: C,
    sender: mpsc::Sender<Job>,
    receiver: Mutex<mpsc::Receiver<Job>>,
    extras: Mutex<Vec<Job>>,
    state: Mutex<CatalystState>,
}

impl Catalyst<SystemClock> {
    /// Builds a catalyst driven by the real wall clock.
    pub fn new(id: EntityId) -> Self {
        Self::with_clock(id, SystemClock)
    }
}

impl<C: Clock> Catalyst<C> {
    pub fn with_clock(id: EntityId, clock: C) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            id,
            clock,
            sender,
            receiver: Mutex::new(receiver),
            extras: Mutex::new(Vec::new()),
            state: Mutex::new(CatalystState {
                tonics: Vec::new(),
                timers: Vec::new(),
                next_timer_id: 0,
                running: true,
            }),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Enqueues `job` onto this catalyst's FIFO queue. The sole cross-thread
    /// channel into a catalyst (spec.md §5); safe to call from any thread,
    /// including this catalyst's own.
    pub fn enqueue(&self, job: Job) {
        // A closed receiver only happens after the catalyst has fully
        // shut down; dropping the job silently matches "the catalyst is a
        // black box from outside its thread" (spec.md §7).
        let _ = self.sender.send(job);
    }

    /// Pushes a follow-up job onto the extra-sparkles stack, to run after
    /// the currently-executing job and before the next item pulled from the
    /// queue (spec.md §4.3/§9). Must be called from a job running on this
    /// catalyst's own thread; the stack is drained strictly between queue
    /// items, so a push from any other context would sit until the next
    /// step ran, never invoked.
    pub fn push_extra(&self, job: Job) {
        self.extras.lock().push(job);
    }

    /// Registers `tonic_id` as attached to this catalyst.
    pub fn bind_tonic(&self, tonic_id: EntityId) {
        let mut state = self.state.lock();
        if !state.tonics.contains(&tonic_id) {
            state.tonics.push(tonic_id);
        }
    }

    /// Deregisters `tonic_id`. If this empties the attached-tonic set, the
    /// catalyst marks itself finished: the next [`Catalyst::loop_body_once`]
    /// call (or an already-blocked one, once it next wakes) returns
    /// [`LoopStep::Finished`].
    pub fn remove_tonic(&self, tonic_id: EntityId) {
        let mut state = self.state.lock();
        state.tonics.retain(|id| *id != tonic_id);
        if state.tonics.is_empty() {
            state.running = false;
        }
    }

    /// The tonics currently attached to this catalyst, in attachment order.
    pub fn attached_tonics(&self) -> Vec<EntityId> {
        self.state.lock().tonics.clone()
    }

    /// Requests that this catalyst stop driving its loop once it next gets
    /// a chance to check, independent of its attached-tonic count. Used by
    /// the main-catalyst shutdown cascade (spec.md §4.3: "every other
    /// catalyst receives a `main_catalyst_finished` signal").
    pub fn request_finish(&self) {
        self.state.lock().running = false;
        // Wake a blocked recv_timeout immediately rather than waiting out
        // the idle timeout or the next timer deadline.
        self.enqueue(Box::new(|| {}));
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Registers a new timer and returns its id. The callback runs on this
    /// catalyst's thread, inline with the loop (spec.md §4.3 "Timer
    /// contract"), wrapped the same way a dequeued job is: a panic is
    /// caught and logged, never propagated.
    pub fn start_timer(
        &self,
        kind: TimerKind,
        period: Duration,
        callback: impl FnMut() + Send + 'static,
    ) -> TimerId {
        let mut state = self.state.lock();
        let id = TimerId(state.next_timer_id);
        state.next_timer_id += 1;
        let deadline = self.clock.now() + period;
        state.timers.push(TimerSlot {
            id,
            kind,
            period,
            deadline: Some(deadline),
            remaining: None,
            callback: Box::new(callback),
        });
        id
    }

    /// Restarts a timer from now, using its existing period. Errors if the
    /// timer is already running (spec.md §7 misuse class).
    pub fn restart_timer(&self, id: TimerId) -> Result<(), CatalystError> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let slot = find_timer_mut(&mut state.timers, id)?;
        if slot.is_running() {
            return Err(CatalystError::TimerAlreadyRunning(id));
        }
        slot.remaining = None;
        slot.deadline = Some(now + slot.period);
        Ok(())
    }

    /// Stops a timer; it will not fire again until [`Catalyst::restart_timer`].
    pub fn stop_timer(&self, id: TimerId) -> Result<(), CatalystError> {
        let mut state = self.state.lock();
        let slot = find_timer_mut(&mut state.timers, id)?;
        slot.deadline = None;
        slot.remaining = None;
        Ok(())
    }

    /// Pauses a running timer, preserving the time left until its deadline.
    pub fn pause_timer(&self, id: TimerId) -> Result<(), CatalystError> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let slot = find_timer_mut(&mut state.timers, id)?;
        if let Some(deadline) = slot.deadline.take() {
            slot.remaining = Some(deadline.saturating_duration_since(now));
        }
        Ok(())
    }

    /// Resumes a paused timer from where it left off.
    pub fn resume_timer(&self, id: TimerId) -> Result<(), CatalystError> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let slot = find_timer_mut(&mut state.timers, id)?;
        if let Some(remaining) = slot.remaining.take() {
            slot.deadline = Some(now + remaining);
        }
        Ok(())
    }

    /// Drives the loop until it reports [`LoopStep::Finished`]. Catalyst id
    /// 0 calls this directly on the main thread; other catalysts call it
    /// from [`Catalyst::spawn_worker`]'s thread body.
    pub fn run(&self) {
        while self.loop_body_once() == LoopStep::Continue {}
    }

    /// One dequeue-execute-or-service-timers step, extracted as its own
    /// method per spec.md §9's "expose the catalyst's loop body as an
    /// injectable strategy" redesign flag — a host event loop (e.g. a UI
    /// integration) can call this once per tick instead of [`Catalyst::run`]
    /// owning a blocking thread.
    pub fn loop_body_once(&self) -> LoopStep {
        if !self.is_running() {
            return LoopStep::Finished;
        }

        let wait = self.wait_duration();
        let received = {
            let receiver = self.receiver.lock();
            receiver.recv_timeout(wait)
        };

        match received {
            Ok(job) => {
                run_job(job);
                self.drain_extras();
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.service_expired_timers();
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return LoopStep::Finished;
            }
        }

        if self.is_running() {
            LoopStep::Continue
        } else {
            LoopStep::Finished
        }
    }

    fn drain_extras(&self) {
        loop {
            let next = self.extras.lock().pop();
            match next {
                Some(job) => run_job(job),
                None => break,
            }
        }
    }

    /// Time to wait until the earliest timer deadline, or [`IDLE_WAIT`] if
    /// none is scheduled.
    fn wait_duration(&self) -> Duration {
        let state = self.state.lock();
        let now = self.clock.now();
        state
            .timers
            .iter()
            .filter_map(|t| t.deadline)
            .map(|deadline| deadline.saturating_duration_since(now))
            .min()
            .unwrap_or(IDLE_WAIT)
    }

    /// Services every timer whose deadline has already passed, in deadline
    /// order, then returns. Resolves spec.md §9's Open Question about the
    /// suspicious `while next_timer_expire == 0.0` construct: rather than
    /// spin, this takes one pass over whatever is expired right now and
    /// lets the next `loop_body_once` call recompute the wait.
    fn service_expired_timers(&self) {
        let now = self.clock.now();
        let due: Vec<TimerId> = {
            let state = self.state.lock();
            let mut due: Vec<(Instant, TimerId)> = state
                .timers
                .iter()
                .filter_map(|t| t.deadline.filter(|d| *d <= now).map(|d| (d, t.id)))
                .collect();
            due.sort_by_key(|(deadline, _)| *deadline);
            due.into_iter().map(|(_, id)| id).collect()
        };

        for id in due {
            let fired_deadline = {
                let state = self.state.lock();
                state.timers.iter().find(|t| t.id == id).and_then(|t| t.deadline)
            };
            let Some(fired_deadline) = fired_deadline else { continue };

            let mut state = self.state.lock();
            let Some(slot) = state.timers.iter_mut().find(|t| t.id == id) else { continue };
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (slot.callback)()));
            if outcome.is_err() {
                tracing::error!(timer = id.0, "timer callback panicked");
            }
            match slot.on_expire(fired_deadline, now) {
                TimerAction::Reschedule(deadline) => {
                    tracing::trace!(timer = id.0, ?deadline, "timer rescheduled");
                }
                TimerAction::Stop => {
                    tracing::trace!(timer = id.0, "timer finished");
                }
            }
        }
    }
}

fn find_timer_mut(timers: &mut [TimerSlot], id: TimerId) -> Result<&mut TimerSlot, CatalystError> {
    timers.iter_mut().find(|t| t.id == id).ok_or(CatalystError::TimerNotFound(id))
}

fn run_job(job: Job) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
    if let Err(_panic) = result {
        tracing::error!("catalyst job panicked; loop continues");
    }
}

impl Catalyst<SystemClock> {
    /// Spawns this catalyst's loop on a dedicated OS thread, for any
    /// catalyst other than the main one (spec.md §4.3: "non-zero catalysts
    /// on a dedicated worker thread"). Requires `'static` + `Send` because
    /// the thread outlives this call; callers typically hold the catalyst
    /// behind an `Arc`.
    pub fn spawn_worker(self: std::sync::Arc<Self>) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || self.run())
    }
}

#[cfg(test)]
#[path = "catalyst_tests.rs"]
mod tests;
