//! The host environment seen by the promise runtime.
//!
//! The runtime never runs callbacks on its own; it asks the host to run a
//! microtask soon, to fire a task after a delay, and to surface rejections
//! that nobody handled.

use crate::task_queue::{MicroTask, Task, TimerId};
use core_types::Value;
use log::error;
use std::time::Duration;

/// Scheduling and error-reporting primitives provided by the embedder.
pub trait Host {
    /// Runs `microtask` after the current synchronous work completes.
    fn schedule_soon(&self, microtask: MicroTask);

    /// Runs `task` once `delay` has elapsed.
    fn schedule_timer(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancels a timer; unknown or already fired ids are ignored.
    fn cancel_timer(&self, id: TimerId);

    /// Surfaces an unhandled rejection to the embedder's error channel.
    fn report_uncaught(&self, reason: &Value) {
        error!("Uncaught (in promise) {}", reason);
    }
}
