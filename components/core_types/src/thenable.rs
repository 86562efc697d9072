//! The thenable capability.
//!
//! Any value that can register settlement callbacks is a thenable. Promise
//! engines adopt the eventual outcome of a thenable when they are resolved
//! with one. Foreign implementations are free to call the callbacks more than
//! once or to fail while registering them; adopters must guard against both.

use crate::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A settlement callback handed to [`Thenable::subscribe`].
pub type SettleFn = Rc<dyn Fn(Value)>;

/// A value exposing a `then`-shaped continuation registration method.
pub trait Thenable: fmt::Debug {
    /// Registers callbacks for fulfillment and rejection.
    ///
    /// Returning `Err` is the equivalent of `then` throwing; the error is the
    /// thrown value.
    fn subscribe(&self, on_fulfilled: SettleFn, on_rejected: SettleFn) -> Result<(), Value>;

    /// Allows engines to recognize their own thenables.
    fn as_any(&self) -> &dyn Any;
}
