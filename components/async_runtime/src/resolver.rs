//! Resolve/reject capabilities handed out by promise constructors.

use crate::promise::{Outcome, Promise};
use crate::runtime::Runtime;
use core_types::{SettleFn, Value};
use std::rc::Rc;

/// One side of a promise's resolving functions.
///
/// Calling it after the promise has settled, or while it is blocked on a
/// thenable, does nothing.
#[derive(Clone, Debug)]
pub struct ResolveFn {
    promise: Promise,
    outcome: Outcome,
}

impl ResolveFn {
    pub(crate) fn new(promise: &Promise, outcome: Outcome) -> Self {
        Self {
            promise: promise.clone(),
            outcome,
        }
    }

    /// Settles (or blocks) the promise with `value`.
    pub fn call(&self, value: Value) {
        self.promise.resolve_with(self.outcome, value);
    }

    /// Converts into a plain callback, e.g. for subscribing to a thenable.
    pub fn to_settle_fn(&self) -> SettleFn {
        let this = self.clone();
        Rc::new(move |value: Value| this.call(value))
    }
}

/// A promise together with its resolve and reject functions.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Promise, PromiseState, Runtime};
/// use core_types::Value;
///
/// let runtime = Runtime::new(EventLoop::new());
/// let resolver = Promise::with_resolver(&runtime);
/// resolver.reject.call(Value::from("nope"));
/// resolver.resolve.call(Value::Smi(1));
/// assert_eq!(resolver.promise.state(), PromiseState::Rejected);
/// ```
#[derive(Clone, Debug)]
pub struct Resolver {
    /// The promise being controlled
    pub promise: Promise,
    /// Resolves `promise`
    pub resolve: ResolveFn,
    /// Rejects `promise`
    pub reject: ResolveFn,
}

impl Promise {
    /// Creates a pending promise and returns it with its resolving functions.
    #[track_caller]
    pub fn with_resolver(runtime: &Runtime) -> Resolver {
        let promise = Promise::pending(runtime);
        Resolver {
            resolve: ResolveFn::new(&promise, Outcome::Fulfilled),
            reject: ResolveFn::new(&promise, Outcome::Rejected),
            promise,
        }
    }
}
