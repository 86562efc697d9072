//! Promise handlers and the callback entries that hold them.

use crate::promise::Promise;
use core_types::Value;
use std::fmt;

/// Outcome of a handler: `Ok` resolves the child, `Err` rejects it with the
/// "thrown" value.
pub type HandlerResult = Result<Value, Value>;

/// A one-shot fulfillment or rejection handler.
///
/// Handlers receive the execution context (`this`) registered with them and
/// the settled value or reason.
///
/// # Examples
///
/// ```
/// use async_runtime::Handler;
/// use core_types::Value;
///
/// let double = Handler::new(|v| Ok(Value::Smi(v.as_smi().unwrap_or(0) * 2)));
/// assert_eq!(double.call(&Value::Undefined, Value::Smi(21)), Ok(Value::Smi(42)));
/// ```
pub struct Handler {
    callback: Box<dyn FnOnce(&Value, Value) -> HandlerResult>,
}

impl Handler {
    /// Creates a handler that ignores its context.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Value) -> HandlerResult + 'static,
    {
        Self {
            callback: Box::new(move |_, value| f(value)),
        }
    }

    /// Creates a handler that receives its context as the first argument.
    pub fn with_context<F>(f: F) -> Self
    where
        F: FnOnce(&Value, Value) -> HandlerResult + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Invokes the handler.
    pub fn call(self, context: &Value, value: Value) -> HandlerResult {
        (self.callback)(context, value)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler {{ ... }}")
    }
}

/// A registration made by `then`, `then_void`, `then_catch` or
/// `then_always`.
///
/// Entries are pooled by the runtime; [`CallbackEntry::reset`] must drop
/// every handler and the child reference before an entry is reused.
#[derive(Debug, Default)]
pub(crate) struct CallbackEntry {
    /// Promise produced by `then`; referenced, not owned
    pub(crate) child: Option<Promise>,
    pub(crate) on_fulfilled: Option<Handler>,
    pub(crate) on_rejected: Option<Handler>,
    /// `this` for the handlers
    pub(crate) context: Value,
    /// Cleanup-only entry: no child, ignored by cancellation accounting
    pub(crate) always: bool,
}

impl CallbackEntry {
    pub(crate) fn reset(&mut self) {
        self.child = None;
        self.on_fulfilled = None;
        self.on_rejected = None;
        self.context = Value::Undefined;
        self.always = false;
    }

    /// Whether running this entry for a rejection counts as handling it.
    ///
    /// Child entries always forward the rejection, so they count even
    /// without an explicit rejection handler.
    pub(crate) fn handles_rejection(&self) -> bool {
        !self.always && (self.child.is_some() || self.on_rejected.is_some())
    }
}
