//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by the promise engine:
//! value representation, error types, stack frames and the thenable
//! capability.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsError`] - JavaScript errors with stack traces
//! - [`ErrorKind`] - Types of JavaScript errors
//! - [`StackFrame`] - Call stack frame information
//! - [`Thenable`] - Anything a promise can adopt
//!
//! # Examples
//!
//! ```
//! use core_types::{Value, JsError, ErrorKind};
//!
//! let cancelled = Value::from(JsError::cancellation(Some("stop")));
//! assert!(cancelled.is_cancellation());
//!
//! let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
//! assert_eq!(Value::from(error).to_string(), "TypeError: undefined is not a function");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod thenable;
mod value;

pub use error::{ErrorKind, JsError};
pub use source::StackFrame;
pub use thenable::{SettleFn, Thenable};
pub use value::Value;
