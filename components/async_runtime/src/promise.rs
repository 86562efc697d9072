//! Cancellable promise implementation.
//!
//! A promise is resolved by being fulfilled with a value, rejected with a
//! reason, or blocked on another thenable whose outcome it then adopts. Once
//! settled, its result is immutable.
//!
//! Callbacks registered with [`Promise::then`] and friends always run
//! asynchronously, from the runtime's run queue, in registration order.
//!
//! Promises can be cancelled. Cancelling rejects a pending promise with a
//! cancellation error, which flows to its children like any rejection. If the
//! cancelled promise is the only child of a pending parent, the parent is
//! cancelled too; siblings sharing a parent keep it alive.

mod diagnostics;

use crate::callback::{CallbackEntry, Handler};
use crate::resolution::{classify, subscribe_guarded, Resolution};
use crate::resolver::ResolveFn;
use crate::runtime::Runtime;
use crate::task_queue::TimerId;
use core_types::{JsError, SettleFn, StackFrame, Thenable, Value};
use log::{debug, trace};
use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::Location;
use std::rc::{Rc, Weak};

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// Neither fulfilled nor rejected, and not waiting on a thenable
    Pending,
    /// Waiting for an adopted thenable to settle
    Blocked,
    /// Settled with a value
    Fulfilled,
    /// Settled with a reason
    Rejected,
}

impl PromiseState {
    /// True for Fulfilled and Rejected.
    pub fn is_settled(self) -> bool {
        matches!(self, PromiseState::Fulfilled | PromiseState::Rejected)
    }
}

/// The two ways a value can be handed to the resolution procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Fulfilled,
    Rejected,
}

impl Outcome {
    fn from_state(state: PromiseState) -> Option<Self> {
        match state {
            PromiseState::Fulfilled => Some(Outcome::Fulfilled),
            PromiseState::Rejected => Some(Outcome::Rejected),
            PromiseState::Pending | PromiseState::Blocked => None,
        }
    }
}

impl From<Outcome> for PromiseState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Fulfilled => PromiseState::Fulfilled,
            Outcome::Rejected => PromiseState::Rejected,
        }
    }
}

struct PromiseInner {
    state: PromiseState,
    result: Value,
    /// Promise whose `then` produced this one; cleared once it can no longer
    /// matter for cancellation
    parent: Option<Weak<PromiseCell>>,
    entries: VecDeque<Box<CallbackEntry>>,
    /// A flush of `entries` is already queued
    executing: bool,
    unhandled_timer: Option<TimerId>,
    unhandled_pending: bool,
    stack: Vec<StackFrame>,
    current_step: usize,
}

struct PromiseCell {
    id: u64,
    runtime: Runtime,
    inner: RefCell<PromiseInner>,
}

impl Drop for PromiseCell {
    /// Tears down chains of pending children without recursing per link.
    fn drop(&mut self) {
        let mut orphans: Vec<Box<CallbackEntry>> =
            self.inner.get_mut().entries.drain(..).collect();
        while let Some(mut entry) = orphans.pop() {
            let Some(child) = entry.child.take() else {
                continue;
            };
            if let Ok(mut cell) = Rc::try_unwrap(child.cell) {
                orphans.extend(cell.inner.get_mut().entries.drain(..));
            }
        }
    }
}

/// A cancellable promise. Clones are handles to the same promise.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Handler, Promise, PromiseState, Runtime};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let runtime = Runtime::new(event_loop.clone());
///
/// let promise = Promise::pending(&runtime);
/// let doubled = promise.then(
///     Some(Handler::new(|v| Ok(Value::Smi(v.as_smi().unwrap_or(0) * 2)))),
///     None,
///     None,
/// );
/// promise.resolve(Value::Smi(21));
/// assert_eq!(doubled.state(), PromiseState::Pending);
///
/// event_loop.run_until_done().unwrap();
/// assert_eq!(doubled.result(), Some(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Promise {
    cell: Rc<PromiseCell>,
}

impl Promise {
    /// Creates a promise and runs `resolver` immediately with its resolve and
    /// reject functions. An `Err` from the resolver rejects the promise.
    #[track_caller]
    pub fn new<F>(runtime: &Runtime, resolver: F) -> Self
    where
        F: FnOnce(ResolveFn, ResolveFn) -> Result<(), Value>,
    {
        let promise = Self::create(runtime);
        promise.record_frame("created", Location::caller());
        let resolve = ResolveFn::new(&promise, Outcome::Fulfilled);
        let reject = ResolveFn::new(&promise, Outcome::Rejected);
        if let Err(thrown) = resolver(resolve, reject) {
            promise.resolve_with(Outcome::Rejected, thrown);
        }
        promise
    }

    /// Creates a pending promise to be settled through [`Promise::resolve`]
    /// or [`Promise::reject`].
    #[track_caller]
    pub fn pending(runtime: &Runtime) -> Self {
        let promise = Self::create(runtime);
        promise.record_frame("created", Location::caller());
        promise
    }

    fn create(runtime: &Runtime) -> Self {
        Self {
            cell: Rc::new(PromiseCell {
                id: runtime.next_promise_id(),
                runtime: runtime.clone(),
                inner: RefCell::new(PromiseInner {
                    state: PromiseState::Pending,
                    result: Value::Undefined,
                    parent: None,
                    entries: VecDeque::new(),
                    executing: false,
                    unhandled_timer: None,
                    unhandled_pending: false,
                    stack: Vec::new(),
                    current_step: 0,
                }),
            }),
        }
    }

    /// Resolves the promise. A thenable value blocks it until the thenable
    /// settles. No-op unless the promise is pending.
    pub fn resolve(&self, value: Value) {
        self.resolve_with(Outcome::Fulfilled, value);
    }

    /// Rejects the promise. No-op unless the promise is pending.
    pub fn reject(&self, reason: Value) {
        self.resolve_with(Outcome::Rejected, reason);
    }

    /// Current state.
    pub fn state(&self) -> PromiseState {
        self.cell.inner.borrow().state
    }

    /// The fulfillment value or rejection reason, once settled.
    pub fn result(&self) -> Option<Value> {
        let inner = self.cell.inner.borrow();
        inner.state.is_settled().then(|| inner.result.clone())
    }

    /// True once fulfilled or rejected.
    pub fn is_settled(&self) -> bool {
        self.state().is_settled()
    }

    /// True while neither settled nor blocked.
    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// Identifier unique within the runtime.
    pub fn id(&self) -> u64 {
        self.cell.id
    }

    /// The runtime this promise schedules on.
    pub fn runtime(&self) -> &Runtime {
        &self.cell.runtime
    }

    /// The promise whose `then` produced this one, while that link matters.
    pub fn parent(&self) -> Option<Promise> {
        let parent = self.cell.inner.borrow().parent.clone();
        parent.and_then(|weak| weak.upgrade()).map(|cell| Promise { cell })
    }

    /// True if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Wraps this promise as a [`Value`] so it can be used as a resolution
    /// value or handler result.
    pub fn to_value(&self) -> Value {
        Value::Thenable(Rc::new(self.clone()))
    }

    /// Registers handlers and returns a new child promise.
    ///
    /// The child is resolved with the handler's `Ok` value (blocking on it if
    /// it is a thenable) or rejected with its `Err` value. A missing
    /// `on_fulfilled` passes the value through; a missing `on_rejected`
    /// passes the rejection through. Handlers never run before this call
    /// returns.
    #[track_caller]
    pub fn then(
        &self,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        context: Option<Value>,
    ) -> Promise {
        let location = Location::caller();
        self.record_frame("then", location);
        self.add_child_promise(on_fulfilled, on_rejected, context, location)
    }

    /// Registers handlers without creating a child promise.
    ///
    /// Errors returned by the handlers go to the unhandled-rejection handler.
    pub fn then_void(
        &self,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        context: Option<Value>,
    ) {
        let mut entry = self.runtime().acquire_entry();
        entry.on_fulfilled = on_fulfilled;
        entry.on_rejected = on_rejected;
        entry.context = context.unwrap_or_default();
        self.add_callback_entry(entry);
    }

    /// Registers a cleanup callback that runs once the promise settles,
    /// whatever the outcome. Returns this promise for chaining.
    ///
    /// The callback does not count as a child for cancellation and does not
    /// mark a rejection as handled.
    #[track_caller]
    pub fn then_always<F>(&self, on_settled: F, context: Option<Value>) -> Promise
    where
        F: FnOnce(&Value) -> Result<(), Value> + 'static,
    {
        self.record_frame("then_always", Location::caller());
        let mut entry = self.runtime().acquire_entry();
        entry.on_fulfilled = Some(Handler::with_context(move |this, _| {
            on_settled(this).map(|()| Value::Undefined)
        }));
        entry.context = context.unwrap_or_default();
        entry.always = true;
        self.add_callback_entry(entry);
        self.clone()
    }

    /// Registers a rejection handler; same as `then(None, Some(on_rejected))`.
    #[track_caller]
    pub fn then_catch(&self, on_rejected: Handler, context: Option<Value>) -> Promise {
        let location = Location::caller();
        self.record_frame("then_catch", location);
        self.add_child_promise(None, Some(on_rejected), context, location)
    }

    /// Cancels the promise if it is still pending.
    ///
    /// The cancellation runs on the run queue. Children are rejected with the
    /// same cancellation error. If this promise is the only child of a
    /// pending parent, the parent is cancelled as well, which may propagate
    /// through several generations.
    pub fn cancel(&self, message: Option<&str>) {
        if self.state() != PromiseState::Pending {
            return;
        }
        debug!("cancel requested for promise {}", self.id());
        let err = Value::from(JsError::cancellation(message));
        let promise = self.clone();
        self.runtime().run(move || promise.cancel_internal(err));
    }

    fn cancel_internal(&self, err: Value) {
        if self.state() != PromiseState::Pending {
            return;
        }
        let parent = self.cell.inner.borrow_mut().parent.take();
        match parent.and_then(|weak| weak.upgrade()) {
            Some(cell) => Promise { cell }.cancel_child(self, err),
            None => self.resolve_with(Outcome::Rejected, err),
        }
    }

    /// Cancels `child` on behalf of this promise.
    ///
    /// If `child` is the only non-cleanup registration and this promise is
    /// pending, this promise is cancelled instead. Otherwise the child's
    /// entry is removed and run right away as a rejection.
    fn cancel_child(&self, child: &Promise, err: Value) {
        let (child_index, child_count) = {
            let inner = self.cell.inner.borrow();
            let mut child_index = None;
            let mut child_count = 0;
            for (index, entry) in inner.entries.iter().enumerate() {
                if entry.always {
                    continue;
                }
                child_count += 1;
                if entry.child.as_ref().is_some_and(|c| c.ptr_eq(child)) {
                    child_index = Some(index);
                }
                if child_index.is_some() && child_count > 1 {
                    break;
                }
            }
            (child_index, child_count)
        };
        let Some(index) = child_index else {
            return;
        };

        if self.state() == PromiseState::Pending && child_count == 1 {
            debug!(
                "promise {} lost its only child {}, cancelling upward",
                self.id(),
                child.id()
            );
            self.cancel_internal(err);
        } else {
            let entry = self.cell.inner.borrow_mut().entries.remove(index);
            if let Some(entry) = entry {
                self.execute_callback(entry, Outcome::Rejected, err);
            }
        }
    }

    fn add_child_promise(
        &self,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        context: Option<Value>,
        location: &Location<'_>,
    ) -> Promise {
        let child = Self::create(self.runtime());
        child.record_frame("created", location);
        child.cell.inner.borrow_mut().parent = Some(Rc::downgrade(&self.cell));

        let mut entry = self.runtime().acquire_entry();
        entry.child = Some(child.clone());
        entry.on_fulfilled = on_fulfilled;
        entry.on_rejected = on_rejected;
        entry.context = context.unwrap_or_default();
        self.add_callback_entry(entry);
        child
    }

    fn add_callback_entry(&self, entry: Box<CallbackEntry>) {
        let needs_schedule = {
            let mut inner = self.cell.inner.borrow_mut();
            let needs_schedule = inner.entries.is_empty() && inner.state.is_settled();
            inner.entries.push_back(entry);
            needs_schedule
        };
        if needs_schedule {
            self.schedule_callbacks();
        }
    }

    /// The resolution procedure.
    pub(crate) fn resolve_with(&self, outcome: Outcome, value: Value) {
        if self.state() != PromiseState::Pending {
            return;
        }
        let (outcome, value) = if self.is_resolution_of_self(&value) {
            (
                Outcome::Rejected,
                Value::from(JsError::type_error("Promise cannot resolve to itself")),
            )
        } else {
            (outcome, value)
        };

        self.cell.inner.borrow_mut().state = PromiseState::Blocked;
        if self.adopt(&value) {
            return;
        }

        let report = outcome == Outcome::Rejected && !value.is_cancellation();
        let reason = report.then(|| value.clone());
        {
            let mut inner = self.cell.inner.borrow_mut();
            inner.result = value;
            inner.state = outcome.into();
            inner.parent = None;
        }
        self.schedule_callbacks();

        if let Some(reason) = reason {
            self.add_unhandled_rejection(reason);
        }
    }

    fn is_resolution_of_self(&self, value: &Value) -> bool {
        match value {
            Value::Thenable(thenable) => thenable
                .as_any()
                .downcast_ref::<Promise>()
                .is_some_and(|promise| promise.ptr_eq(self)),
            _ => false,
        }
    }

    /// Blocks on `value` if it is a thenable.
    fn adopt(&self, value: &Value) -> bool {
        match classify(value) {
            Resolution::Native(promise) => {
                trace!("promise {} blocked on promise {}", self.id(), promise.id());
                let (fulfill, reject) = (self.clone(), self.clone());
                promise.then_void(
                    Some(Handler::new(move |v| {
                        fulfill.unblock(Outcome::Fulfilled, v);
                        Ok(Value::Undefined)
                    })),
                    Some(Handler::new(move |r| {
                        reject.unblock(Outcome::Rejected, r);
                        Ok(Value::Undefined)
                    })),
                    None,
                );
                true
            }
            Resolution::Foreign(thenable) => {
                trace!("promise {} blocked on a foreign thenable", self.id());
                let (fulfill, reject) = (self.clone(), self.clone());
                subscribe_guarded(
                    &thenable,
                    Rc::new(move |v: Value| fulfill.unblock(Outcome::Fulfilled, v)),
                    Rc::new(move |r: Value| reject.unblock(Outcome::Rejected, r)),
                );
                true
            }
            Resolution::Plain => false,
        }
    }

    fn unblock(&self, outcome: Outcome, value: Value) {
        {
            let mut inner = self.cell.inner.borrow_mut();
            if inner.state != PromiseState::Blocked {
                return;
            }
            inner.state = PromiseState::Pending;
        }
        self.resolve_with(outcome, value);
    }

    fn schedule_callbacks(&self) {
        {
            let mut inner = self.cell.inner.borrow_mut();
            if inner.executing {
                return;
            }
            inner.executing = true;
        }
        let promise = self.clone();
        self.runtime().run(move || promise.execute_callbacks());
    }

    fn execute_callbacks(&self) {
        let long_stack = self.runtime().config().long_stack_traces;
        loop {
            let next = {
                let mut inner = self.cell.inner.borrow_mut();
                let outcome = Outcome::from_state(inner.state);
                match (outcome, inner.entries.pop_front()) {
                    (Some(outcome), Some(entry)) => {
                        if long_stack {
                            inner.current_step += 1;
                        }
                        Some((entry, outcome, inner.result.clone()))
                    }
                    (None, Some(entry)) => {
                        inner.entries.push_front(entry);
                        None
                    }
                    (_, None) => None,
                }
            };
            match next {
                Some((entry, outcome, result)) => self.execute_callback(entry, outcome, result),
                None => break,
            }
        }
        self.cell.inner.borrow_mut().executing = false;
    }

    fn execute_callback(&self, mut entry: Box<CallbackEntry>, outcome: Outcome, result: Value) {
        if outcome == Outcome::Rejected && entry.handles_rejection() {
            self.remove_unhandled_rejection();
        }

        let child = entry.child.take();
        let on_fulfilled = entry.on_fulfilled.take();
        let on_rejected = entry.on_rejected.take();
        let context = std::mem::take(&mut entry.context);
        let always = entry.always;
        self.runtime().release_entry(entry);

        if let Some(child) = child {
            child.cell.inner.borrow_mut().parent = None;
            let settled = invoke(outcome, result, on_fulfilled, on_rejected, &context);
            match settled {
                Ok(value) => child.resolve_with(Outcome::Fulfilled, value),
                Err(reason) => child.resolve_with(Outcome::Rejected, reason),
            }
            return;
        }

        let handler = match (always, outcome) {
            (true, _) | (false, Outcome::Fulfilled) => on_fulfilled,
            (false, Outcome::Rejected) => on_rejected,
        };
        let argument = if always { Value::Undefined } else { result };
        if let Some(handler) = handler {
            if let Err(thrown) = handler.call(&context, argument) {
                self.runtime().handle_rejection(&thrown);
            }
        }
    }

    fn record_frame(&self, label: &str, location: &Location<'_>) {
        if self.runtime().config().long_stack_traces {
            self.cell
                .inner
                .borrow_mut()
                .stack
                .push(StackFrame::from_location(label, location));
        }
    }

    /// Call sites recorded while long stack traces are enabled.
    pub fn stack_frames(&self) -> Vec<StackFrame> {
        self.cell.inner.borrow().stack.clone()
    }
}

/// Runs the handler matching `outcome` for a child-producing entry.
///
/// A rejection handler that returns `Undefined` for a cancellation keeps the
/// cancellation flowing to the child.
fn invoke(
    outcome: Outcome,
    result: Value,
    on_fulfilled: Option<Handler>,
    on_rejected: Option<Handler>,
    context: &Value,
) -> Result<Value, Value> {
    match outcome {
        Outcome::Fulfilled => match on_fulfilled {
            Some(handler) => handler.call(context, result),
            None => Ok(result),
        },
        Outcome::Rejected => match on_rejected {
            Some(handler) => {
                let cancellation = result.is_cancellation().then(|| result.clone());
                match (handler.call(context, result), cancellation) {
                    (Ok(Value::Undefined), Some(reason)) => Err(reason),
                    (settled, _) => settled,
                }
            }
            None => Err(result),
        },
    }
}

impl Thenable for Promise {
    fn subscribe(&self, on_fulfilled: SettleFn, on_rejected: SettleFn) -> Result<(), Value> {
        self.then_void(
            Some(Handler::new(move |v| {
                on_fulfilled(v);
                Ok(Value::Undefined)
            })),
            Some(Handler::new(move |r| {
                on_rejected(r);
                Ok(Value::Undefined)
            })),
            None,
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Thenable(Rc::new(promise))
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Promise");
        s.field("id", &self.cell.id);
        match self.cell.inner.try_borrow() {
            Ok(inner) => s.field("state", &inner.state),
            Err(_) => s.field("state", &"<busy>"),
        };
        s.finish()
    }
}
