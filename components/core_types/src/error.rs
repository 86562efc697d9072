//! JavaScript error types and error handling.
//!
//! This module provides error types that correspond to JavaScript's built-in
//! error types, along with stack trace information. Promise rejections carry
//! these errors as [`Value::Error`](crate::Value::Error).

use crate::StackFrame;
use std::fmt;
use thiserror::Error;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors, plus the
/// distinguished cancellation error used by cancellable promises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Generic `Error`
    Error,
    /// Type error (e.g., resolving a promise with itself)
    TypeError,
    /// Rejection reason of a cancelled promise
    CancellationError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::CancellationError => "CancellationError",
        };
        f.write_str(name)
    }
}

/// A JavaScript error with message and stack trace.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind};
///
/// let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
///
/// assert_eq!(error.message, "undefined is not a function");
/// assert_eq!(error.to_string(), "TypeError: undefined is not a function");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Stack trace; promise diagnostics append their long trace here
    pub stack: Vec<StackFrame>,
}

impl JsError {
    /// Creates an error of the given kind with an empty stack.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates a cancellation error, optionally carrying a debugging message.
    pub fn cancellation(message: Option<&str>) -> Self {
        Self::new(ErrorKind::CancellationError, message.unwrap_or_default())
    }

    /// Returns true if this error is a cancellation error.
    pub fn is_cancellation(&self) -> bool {
        self.kind == ErrorKind::CancellationError
    }
}
