//! Single-threaded task queue with timers.
//!
//! Stands in for the host's scheduler: `defer` queues work for the next
//! turn, `schedule_after` arms a timer against the loop's [`Clock`]. Nothing
//! runs until the owner drives the loop with [`EventLoop::turn`],
//! [`EventLoop::run_until_idle`] or [`EventLoop::run_for`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send>;

/// Upper bound on turns taken by `run_until_idle` before it gives up.
const MAX_IDLE_TURNS: usize = 10_000;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct TimerEntry {
    id: TimerId,
    due: DateTime<Utc>,
    task: Task,
}

/// Cooperative event loop.
pub struct EventLoop {
    clock: Arc<dyn Clock>,
    queue_tx: Sender<Task>,
    queue_rx: Receiver<Task>,
    timers: Mutex<Vec<TimerEntry>>,
    next_timer: AtomicU64,
}

impl EventLoop {
    /// Creates a loop on the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a loop driven by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (queue_tx, queue_rx) = unbounded::<Task>();
        Self {
            clock,
            queue_tx,
            queue_rx,
            timers: Mutex::new(Vec::new()),
            next_timer: AtomicU64::new(1),
        }
    }

    /// The loop's clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time on the loop's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Queues `task` for the next turn.
    pub fn defer(&self, task: impl FnOnce() + Send + 'static) {
        // Both ends live in `self`, so the send cannot fail.
        let _ = self.queue_tx.send(Box::new(task));
    }

    /// Runs `task` once `delay` has elapsed.
    pub fn schedule_after(&self, delay: Duration, task: impl FnOnce() + Send + 'static) -> TimerId {
        let id = TimerId(self.next_timer.fetch_add(1, Ordering::Relaxed));
        let due = self.clock.now() + delay;
        self.timers.lock().push(TimerEntry {
            id,
            due,
            task: Box::new(task),
        });
        id
    }

    /// Cancels a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut timers = self.timers.lock();
        let before = timers.len();
        timers.retain(|t| t.id != id);
        timers.len() != before
    }

    /// Number of tasks waiting for the next turn.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.queue_rx.len()
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.lock().len()
    }

    /// Deadline of the earliest armed timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.lock().iter().map(|t| t.due).min()
    }

    /// Runs one turn: the tasks queued before the turn began, then every
    /// timer that is due. Returns how many tasks ran.
    pub fn turn(&self) -> usize {
        let mut ran = 0;

        let queued = self.queue_rx.len();
        for _ in 0..queued {
            match self.queue_rx.try_recv() {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(_) => break,
            }
        }

        let now = self.clock.now();
        let mut due: Vec<TimerEntry> = {
            let mut timers = self.timers.lock();
            let (ready, waiting): (Vec<_>, Vec<_>) = timers.drain(..).partition(|t| t.due <= now);
            *timers = waiting;
            ready
        };
        due.sort_by_key(|t| (t.due, t.id));
        for timer in due {
            (timer.task)();
            ran += 1;
        }

        ran
    }

    /// Runs turns until no ready work remains. Returns how many tasks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        for _ in 0..MAX_IDLE_TURNS {
            let ran = self.turn();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
        tracing::warn!(turns = MAX_IDLE_TURNS, "event loop still busy, yielding");
        total
    }

    /// Drives the loop for `duration` of clock time, sleeping between timers.
    pub fn run_for(&self, duration: Duration) -> usize {
        let deadline = self.clock.now() + duration;
        let mut total = self.run_until_idle();

        while let Some(next) = self.next_deadline() {
            if next > deadline {
                break;
            }
            let wait = next - self.clock.now();
            if wait > Duration::zero() {
                self.clock.sleep(wait);
            }
            total += self.run_until_idle();
        }

        let remaining = deadline - self.clock.now();
        if remaining > Duration::zero() {
            self.clock.sleep(remaining);
        }
        total
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending_tasks", &self.pending_tasks())
            .field("pending_timers", &self.pending_timers())
            .finish_non_exhaustive()
    }
}
