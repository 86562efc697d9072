//! Unhandled rejection tracking and long stack traces.

use super::{Promise, PromiseState};
use crate::config::RejectionDelay;
use crate::task_queue::Task;
use core_types::{StackFrame, Value};
use log::debug;

impl Promise {
    /// Arms the unhandled-rejection report for a freshly rejected promise.
    pub(super) fn add_unhandled_rejection(&self, reason: Value) {
        match self.runtime().config().rejection_delay() {
            RejectionDelay::Disabled => {}
            RejectionDelay::After(delay) => {
                let promise = self.clone();
                let id = self.runtime().host().schedule_timer(
                    delay,
                    Task::new(move || {
                        promise.cell.inner.borrow_mut().unhandled_timer = None;
                        promise.report_unhandled(reason);
                        Ok(Value::Undefined)
                    }),
                );
                self.cell.inner.borrow_mut().unhandled_timer = Some(id);
            }
            RejectionDelay::Immediate => {
                self.cell.inner.borrow_mut().unhandled_pending = true;
                let promise = self.clone();
                self.runtime().run(move || {
                    let pending =
                        std::mem::take(&mut promise.cell.inner.borrow_mut().unhandled_pending);
                    if pending {
                        promise.report_unhandled(reason);
                    }
                });
            }
        }
    }

    /// Disarms pending reports on this promise and on each ancestor that is
    /// still flagged, stopping at the first one that is not.
    pub(super) fn remove_unhandled_rejection(&self) {
        let delay = self.runtime().config().rejection_delay();
        if delay == RejectionDelay::Disabled {
            return;
        }
        let mut current = Some(self.clone());
        while let Some(promise) = current {
            let (timer, pending, parent) = {
                let mut inner = promise.cell.inner.borrow_mut();
                (
                    inner.unhandled_timer.take(),
                    std::mem::take(&mut inner.unhandled_pending),
                    inner.parent.clone(),
                )
            };
            let flagged = match timer {
                Some(id) => {
                    self.runtime().host().cancel_timer(id);
                    true
                }
                None => pending,
            };
            if !flagged {
                break;
            }
            current = parent
                .and_then(|weak| weak.upgrade())
                .map(|cell| Promise { cell });
        }
    }

    fn report_unhandled(&self, mut reason: Value) {
        self.append_long_stack(&mut reason);
        debug!("unhandled rejection in promise {}", self.id());
        self.runtime().handle_rejection(&reason);
    }

    /// Appends the recorded call sites of this promise and its ancestors to
    /// an error reason.
    ///
    /// Frames of each promise are listed most recent first, followed by the
    /// value that promise settled with.
    pub(super) fn append_long_stack(&self, reason: &mut Value) {
        if !self.runtime().config().long_stack_traces {
            return;
        }
        let Value::Error(err) = reason else {
            return;
        };
        if self.cell.inner.borrow().stack.is_empty() {
            return;
        }

        let mut trace = vec![StackFrame::annotation("Promise trace:")];
        let mut current = Some(self.clone());
        while let Some(promise) = current {
            let parent = {
                let inner = promise.cell.inner.borrow();
                let steps = (inner.current_step + 1).min(inner.stack.len());
                trace.extend(inner.stack[..steps].iter().rev().cloned());
                let label = match inner.state {
                    PromiseState::Rejected => "REJECTED",
                    PromiseState::Fulfilled => "FULFILLED",
                    PromiseState::Pending | PromiseState::Blocked => "PENDING",
                };
                trace.push(StackFrame::annotation(format!(
                    "Value: [{}] <{}>",
                    label, inner.result
                )));
                inner.parent.clone()
            };
            current = parent
                .and_then(|weak| weak.upgrade())
                .map(|cell| Promise { cell });
        }
        err.stack.extend(trace);
    }
}
