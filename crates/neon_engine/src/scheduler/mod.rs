//! Timer scheduling
//!
//! One-shot and repeating timers on the session clock. Tasks receive the
//! shared context and the scheduler itself, so a task can schedule follow-up
//! work or cancel timers, which is how the flicker cycles and the fly-by fade
//! are expressed.
//!
//! Key properties:
//! - Single-threaded; tasks run inside [`TimerQueue::advance`]
//! - Timers fire in due-time order, ties broken by scheduling order
//! - A task sees [`Scheduler::now`] equal to its own due time, so delays
//!   chained from inside a task do not drift with frame timing

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Shortest period accepted by [`Scheduler::every`]
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle for cancelling a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Returned by repeating tasks to keep or drop their timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskControl {
    /// Run again after another period
    Continue,
    /// Cancel this timer
    Stop,
}

/// Task run once when its delay elapses
pub type OnceTask<C> = Box<dyn FnOnce(&mut C, &mut dyn Scheduler<C>)>;

/// Task run every period until it stops or is cancelled
pub type RepeatTask<C> = Box<dyn FnMut(&mut C, &mut dyn Scheduler<C>) -> TaskControl>;

/// Timer primitive the scene effects are written against
pub trait Scheduler<C> {
    /// Current session time
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` from now
    fn after(&mut self, delay: Duration, task: OnceTask<C>) -> TimerHandle;

    /// Run `task` every `period`, first time one period from now
    fn every(&mut self, period: Duration, task: RepeatTask<C>) -> TimerHandle;

    /// Cancel a pending timer; returns whether anything was cancelled
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

enum Task<C> {
    Once(OnceTask<C>),
    Repeat { period: Duration, task: RepeatTask<C> },
}

struct PendingTimer<C> {
    due: Duration,
    task: Task<C>,
}

#[derive(Debug, Clone, Copy)]
struct RunningTimer {
    id: u64,
    cancelled: bool,
}

/// Virtual-time timer queue
///
/// Time only moves through [`TimerQueue::advance`]; the render loop feeds it
/// from a [`Clock`](crate::foundation::time::Clock).
pub struct TimerQueue<C> {
    now: Duration,
    next_id: u64,
    timers: HashMap<u64, PendingTimer<C>>,
    order: BinaryHeap<Reverse<(Duration, u64)>>,
    running: Option<RunningTimer>,
}

impl<C> TimerQueue<C> {
    /// Create an empty queue at time zero
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            timers: HashMap::new(),
            order: BinaryHeap::new(),
            running: None,
        }
    }

    /// Number of timers waiting to fire
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Due time of the earliest live timer
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.values().map(|timer| timer.due).min()
    }

    /// Fire every timer due at or before `to`, in order
    ///
    /// Returns the number of tasks run. Time never moves backwards; an
    /// earlier `to` fires nothing.
    pub fn advance(&mut self, to: Duration, ctx: &mut C) -> usize {
        let mut fired = 0;

        while let Some(&Reverse((due, id))) = self.order.peek() {
            if due > to {
                break;
            }
            self.order.pop();

            // Cancelled timers leave stale heap entries behind
            let Some(timer) = self.timers.remove(&id) else {
                continue;
            };

            self.now = self.now.max(due);
            fired += 1;
            log::trace!("timer {id} fired at {due:?}");

            match timer.task {
                Task::Once(task) => task(ctx, self),
                Task::Repeat { period, mut task } => {
                    self.running = Some(RunningTimer { id, cancelled: false });
                    let control = task(ctx, self);
                    let cancelled = self.running.take().is_some_and(|running| running.cancelled);

                    if control == TaskControl::Continue && !cancelled {
                        self.insert(id, due + period, Task::Repeat { period, task });
                    }
                }
            }
        }

        self.now = self.now.max(to);
        fired
    }

    fn insert(&mut self, id: u64, due: Duration, task: Task<C>) {
        self.timers.insert(id, PendingTimer { due, task });
        self.order.push(Reverse((due, id)));
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl<C> Default for TimerQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> for TimerQueue<C> {
    fn now(&self) -> Duration {
        self.now
    }

    fn after(&mut self, delay: Duration, task: OnceTask<C>) -> TimerHandle {
        let id = self.allocate();
        self.insert(id, self.now + delay, Task::Once(task));
        TimerHandle(id)
    }

    fn every(&mut self, period: Duration, task: RepeatTask<C>) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        let id = self.allocate();
        self.insert(id, self.now + period, Task::Repeat { period, task });
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        if let Some(running) = self.running.as_mut() {
            if running.id == handle.0 {
                running.cancelled = true;
                return true;
            }
        }
        self.timers.remove(&handle.0).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_once_fires_at_due_time() {
        let mut queue = TimerQueue::<Vec<u64>>::new();
        let mut log = Vec::new();

        queue.after(ms(300), Box::new(|log, s| log.push(s.now().as_millis() as u64)));

        assert_eq!(queue.advance(ms(299), &mut log), 0);
        assert!(log.is_empty());

        assert_eq!(queue.advance(ms(1000), &mut log), 1);
        assert_eq!(log, vec![300]);
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.now(), ms(1000));
    }

    #[test]
    fn test_fires_in_due_order_with_stable_ties() {
        let mut queue = TimerQueue::<Vec<&'static str>>::new();
        let mut log = Vec::new();

        queue.after(ms(200), Box::new(|log, _| log.push("late")));
        queue.after(ms(100), Box::new(|log, _| log.push("first")));
        queue.after(ms(100), Box::new(|log, _| log.push("second")));

        queue.advance(ms(500), &mut log);
        assert_eq!(log, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_every_catches_up_in_one_advance() {
        let mut queue = TimerQueue::<u32>::new();
        let mut count = 0;

        queue.every(ms(100), Box::new(|count, _| {
            *count += 1;
            TaskControl::Continue
        }));

        queue.advance(ms(350), &mut count);
        assert_eq!(count, 3);
        assert_eq!(queue.next_due(), Some(ms(400)));
    }

    #[test]
    fn test_repeat_stops_itself() {
        let mut queue = TimerQueue::<u32>::new();
        let mut count = 0;

        queue.every(ms(100), Box::new(|count, _| {
            *count += 1;
            if *count == 2 { TaskControl::Stop } else { TaskControl::Continue }
        }));

        queue.advance(ms(1000), &mut count);
        assert_eq!(count, 2);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_cancel_pending_and_running() {
        struct Ctx {
            ticks: u32,
            handle: Option<TimerHandle>,
        }

        let mut queue = TimerQueue::<Ctx>::new();
        let mut ctx = Ctx { ticks: 0, handle: None };

        let doomed = queue.after(ms(50), Box::new(|ctx, _| ctx.ticks += 100));
        assert!(queue.cancel(doomed));
        assert!(!queue.cancel(doomed));

        let handle = queue.every(ms(10), Box::new(|ctx, s| {
            ctx.ticks += 1;
            if ctx.ticks == 3 {
                if let Some(handle) = ctx.handle {
                    assert!(s.cancel(handle));
                }
            }
            TaskControl::Continue
        }));
        ctx.handle = Some(handle);

        queue.advance(ms(1000), &mut ctx);
        assert_eq!(ctx.ticks, 3);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_nested_scheduling_uses_task_due_time() {
        let mut queue = TimerQueue::<Vec<u64>>::new();
        let mut log = Vec::new();

        queue.after(ms(100), Box::new(|_, s| {
            s.after(ms(50), Box::new(|log, s| log.push(s.now().as_millis() as u64)));
        }));

        // The frame lands late, the chained timer still fires at 150
        queue.advance(ms(400), &mut log);
        assert_eq!(log, vec![150]);
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut queue = TimerQueue::<u32>::new();
        let mut count = 0;

        queue.every(Duration::ZERO, Box::new(|count, _| {
            *count += 1;
            TaskControl::Continue
        }));

        queue.advance(ms(5), &mut count);
        assert_eq!(count, 5);
    }
}
