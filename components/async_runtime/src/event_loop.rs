//! Event loop implementation.
//!
//! This module provides a deterministic event loop that coordinates task,
//! microtask and timer execution. It is the default [`Host`] for the promise
//! runtime. Time is virtual: it only moves when the loop runs out of other
//! work or when [`EventLoop::advance_by`] is called.

use crate::error::RuntimeResult;
use crate::host::Host;
use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue, TimerId, TimerQueue};
use log::trace;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Default)]
struct LoopState {
    task_queue: TaskQueue,
    microtask_queue: MicrotaskQueue,
    timers: TimerQueue,
    now: Duration,
}

/// The event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it
/// 2. Drains all microtasks in the microtask queue
/// 3. Repeats; when only timers remain, the clock jumps to the next one
///
/// The loop is a cheap handle: clones share the same queues, so a clone can
/// be handed to a [`Runtime`](crate::Runtime) while the test keeps driving it.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// event_loop.enqueue_task(Task::new(|| Ok(Value::Undefined)));
/// event_loop.run_until_done().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventLoop {
    state: Rc<RefCell<LoopState>>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the event loop until tasks, microtasks and timers are exhausted.
    pub fn run_until_done(&self) -> RuntimeResult<()> {
        loop {
            if !self.is_task_queue_empty() || !self.is_microtask_queue_empty() {
                self.process_one_cycle()?;
                continue;
            }
            let next_due = self.state.borrow().timers.next_due();
            match next_due {
                Some(due) => self.fire_timers_until(due)?,
                None => return Ok(()),
            }
        }
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.state.borrow_mut().task_queue.enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.state.borrow_mut().microtask_queue.enqueue(microtask);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.state.borrow().task_queue.is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.state.borrow().microtask_queue.is_empty()
    }

    /// Number of queued microtasks.
    pub fn microtask_count(&self) -> usize {
        self.state.borrow().microtask_queue.len()
    }

    /// Number of pending timers.
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// New microtasks added during execution are also processed before this
    /// method returns.
    pub fn run_all_microtasks(&self) -> RuntimeResult<()> {
        loop {
            let next = self.state.borrow_mut().microtask_queue.dequeue();
            match next {
                Some(microtask) => {
                    microtask.run()?;
                }
                None => return Ok(()),
            }
        }
    }

    /// Runs all tasks in the queue (without processing microtasks between them).
    ///
    /// This is primarily for testing purposes.
    pub fn run_all_tasks(&self) -> RuntimeResult<()> {
        loop {
            let next = self.state.borrow_mut().task_queue.dequeue();
            match next {
                Some(task) => {
                    task.run()?;
                }
                None => return Ok(()),
            }
        }
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    pub fn process_one_cycle(&self) -> RuntimeResult<()> {
        let next = self.state.borrow_mut().task_queue.dequeue();
        if let Some(task) = next {
            task.run()?;
        }
        self.run_all_microtasks()
    }

    /// Moves the clock forward by `delta`, firing every timer that becomes
    /// due along the way. Tasks and microtasks are drained first.
    pub fn advance_by(&self, delta: Duration) -> RuntimeResult<()> {
        self.run_until_stalled()?;
        let target = self.now() + delta;
        self.fire_timers_until(target)?;
        self.state.borrow_mut().now = target;
        Ok(())
    }

    /// Runs tasks and microtasks without letting time pass.
    pub fn run_until_stalled(&self) -> RuntimeResult<()> {
        while !self.is_task_queue_empty() || !self.is_microtask_queue_empty() {
            self.process_one_cycle()?;
        }
        Ok(())
    }

    fn fire_timers_until(&self, limit: Duration) -> RuntimeResult<()> {
        loop {
            let due = self.state.borrow_mut().timers.pop_due(limit);
            let Some((at, task)) = due else {
                return Ok(());
            };
            trace!("firing timer due at {:?}", at);
            self.state.borrow_mut().now = at;
            task.run()?;
            self.run_until_stalled()?;
        }
    }
}

impl Host for EventLoop {
    fn schedule_soon(&self, microtask: MicroTask) {
        self.enqueue_microtask(microtask);
    }

    fn schedule_timer(&self, delay: Duration, task: Task) -> TimerId {
        let mut state = self.state.borrow_mut();
        let due = state.now + delay;
        state.timers.schedule(due, task)
    }

    fn cancel_timer(&self, id: TimerId) {
        let cancelled = self.state.borrow_mut().timers.cancel(id);
        drop(cancelled);
    }
}
