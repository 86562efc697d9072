//! Thenable detection and adoption.
//!
//! A value handed to the resolution procedure is classified exactly once.
//! Native promises are chained directly; foreign thenables are wrapped so
//! that only the first settlement callback counts.

use crate::promise::Promise;
use core_types::{SettleFn, Thenable, Value};
use log::trace;
use std::cell::Cell;
use std::rc::Rc;

/// What a resolution value turned out to be.
#[derive(Debug)]
pub(crate) enum Resolution {
    /// A promise from this engine
    Native(Promise),
    /// Any other thenable
    Foreign(Rc<dyn Thenable>),
    /// Not a thenable; settles directly
    Plain,
}

pub(crate) fn classify(value: &Value) -> Resolution {
    match value {
        Value::Thenable(thenable) => match thenable.as_any().downcast_ref::<Promise>() {
            Some(promise) => Resolution::Native(promise.clone()),
            None => Resolution::Foreign(Rc::clone(thenable)),
        },
        _ => Resolution::Plain,
    }
}

/// Subscribes to a foreign thenable.
///
/// Whichever callback runs first wins; later calls are ignored. A failing
/// `subscribe` rejects unless a callback already ran.
pub(crate) fn subscribe_guarded(
    thenable: &Rc<dyn Thenable>,
    on_fulfilled: SettleFn,
    on_rejected: SettleFn,
) {
    let called = Rc::new(Cell::new(false));

    let guard = |callback: SettleFn| -> SettleFn {
        let called = Rc::clone(&called);
        Rc::new(move |value: Value| {
            if !called.replace(true) {
                callback(value);
            }
        })
    };
    let resolve = guard(on_fulfilled);
    let reject = guard(on_rejected);

    if let Err(thrown) = thenable.subscribe(resolve, Rc::clone(&reject)) {
        trace!("foreign thenable failed during subscribe");
        reject(thrown);
    }
}
