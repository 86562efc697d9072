//! Static constructors and promise combinators.
//!
//! Every input may be a native promise, a foreign thenable or a plain value.
//! Plain values count as already fulfilled but are still delivered on the run
//! queue, so a combinator never settles before the call returns.

use crate::callback::Handler;
use crate::promise::Promise;
use crate::resolution::{classify, subscribe_guarded, Resolution};
use crate::resolver::Resolver;
use crate::runtime::Runtime;
use core_types::{SettleFn, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Delivers the eventual outcome of `value` to one of two callbacks.
pub(crate) fn resolve_then(
    runtime: &Runtime,
    value: Value,
    on_fulfilled: SettleFn,
    on_rejected: SettleFn,
) {
    match classify(&value) {
        Resolution::Native(promise) => promise.then_void(
            Some(Handler::new(move |v| {
                on_fulfilled(v);
                Ok(Value::Undefined)
            })),
            Some(Handler::new(move |r| {
                on_rejected(r);
                Ok(Value::Undefined)
            })),
            None,
        ),
        Resolution::Foreign(thenable) => subscribe_guarded(&thenable, on_fulfilled, on_rejected),
        Resolution::Plain => runtime.run(move || on_fulfilled(value)),
    }
}

/// Collects per-input results until every input has reported.
struct Gather {
    remaining: usize,
    slots: Vec<Value>,
}

impl Gather {
    fn new(count: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            remaining: count,
            slots: vec![Value::Undefined; count],
        }))
    }

    /// Stores `value` at `index`; returns all slots once the last one is in.
    fn store(&mut self, index: usize, value: Value) -> Option<Vec<Value>> {
        self.slots[index] = value;
        self.remaining = self.remaining.saturating_sub(1);
        (self.remaining == 0).then(|| std::mem::take(&mut self.slots))
    }
}

fn settled_record(fulfilled: bool, value: Value) -> Value {
    let key = if fulfilled { "value" } else { "reason" };
    let mut record = BTreeMap::new();
    record.insert("fulfilled".to_string(), Value::Boolean(fulfilled));
    record.insert(key.to_string(), value);
    Value::Object(record)
}

impl Promise {
    /// Returns `value` itself if it is a native promise, otherwise a promise
    /// resolved with it.
    #[track_caller]
    pub fn resolved(runtime: &Runtime, value: Value) -> Promise {
        if let Resolution::Native(promise) = classify(&value) {
            return promise;
        }
        let promise = Promise::pending(runtime);
        promise.resolve(value);
        promise
    }

    /// A promise rejected with `reason`.
    #[track_caller]
    pub fn rejected(runtime: &Runtime, reason: Value) -> Promise {
        let promise = Promise::pending(runtime);
        promise.reject(reason);
        promise
    }

    /// Settles like the first input to settle. Empty input resolves with
    /// `Undefined`.
    #[track_caller]
    pub fn race(runtime: &Runtime, values: Vec<Value>) -> Promise {
        let Resolver {
            promise,
            resolve,
            reject,
        } = Promise::with_resolver(runtime);
        if values.is_empty() {
            resolve.call(Value::Undefined);
        }
        for value in values {
            resolve_then(runtime, value, resolve.to_settle_fn(), reject.to_settle_fn());
        }
        promise
    }

    /// Fulfills with an array of every input's value, in input order, or
    /// rejects with the first rejection.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_runtime::{EventLoop, Promise, Runtime};
    /// use core_types::Value;
    ///
    /// let event_loop = EventLoop::new();
    /// let runtime = Runtime::new(event_loop.clone());
    ///
    /// let late = Promise::pending(&runtime);
    /// let all = Promise::all(&runtime, vec![late.to_value(), Value::Smi(2)]);
    /// late.resolve(Value::Smi(1));
    ///
    /// event_loop.run_until_done().unwrap();
    /// assert_eq!(all.result(), Some(Value::Array(vec![Value::Smi(1), Value::Smi(2)])));
    /// ```
    #[track_caller]
    pub fn all(runtime: &Runtime, values: Vec<Value>) -> Promise {
        let Resolver {
            promise,
            resolve,
            reject,
        } = Promise::with_resolver(runtime);
        if values.is_empty() {
            resolve.call(Value::Array(Vec::new()));
            return promise;
        }

        let gather = Gather::new(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let (gather, resolve) = (Rc::clone(&gather), resolve.clone());
            let on_fulfilled: SettleFn = Rc::new(move |v: Value| {
                let done = gather.borrow_mut().store(index, v);
                if let Some(values) = done {
                    resolve.call(Value::Array(values));
                }
            });
            resolve_then(runtime, value, on_fulfilled, reject.to_settle_fn());
        }
        promise
    }

    /// Fulfills, once every input has settled, with one
    /// `{fulfilled, value}` or `{fulfilled, reason}` object per input.
    #[track_caller]
    pub fn all_settled(runtime: &Runtime, values: Vec<Value>) -> Promise {
        let Resolver {
            promise, resolve, ..
        } = Promise::with_resolver(runtime);
        if values.is_empty() {
            resolve.call(Value::Array(Vec::new()));
            return promise;
        }

        let gather = Gather::new(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let settle = |fulfilled: bool| -> SettleFn {
                let (gather, resolve) = (Rc::clone(&gather), resolve.clone());
                Rc::new(move |v: Value| {
                    let done = gather.borrow_mut().store(index, settled_record(fulfilled, v));
                    if let Some(records) = done {
                        resolve.call(Value::Array(records));
                    }
                })
            };
            resolve_then(runtime, value, settle(true), settle(false));
        }
        promise
    }

    /// Fulfills with the first fulfillment. If every input rejects, rejects
    /// with the array of reasons in input order. Empty input resolves with
    /// `Undefined`.
    #[track_caller]
    pub fn first_fulfilled(runtime: &Runtime, values: Vec<Value>) -> Promise {
        let Resolver {
            promise,
            resolve,
            reject,
        } = Promise::with_resolver(runtime);
        if values.is_empty() {
            resolve.call(Value::Undefined);
            return promise;
        }

        let gather = Gather::new(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let (gather, reject) = (Rc::clone(&gather), reject.clone());
            let on_rejected: SettleFn = Rc::new(move |r: Value| {
                let done = gather.borrow_mut().store(index, r);
                if let Some(reasons) = done {
                    reject.call(Value::Array(reasons));
                }
            });
            resolve_then(runtime, value, resolve.to_settle_fn(), on_rejected);
        }
        promise
    }
}
