//! Source position and stack frame types for error tracking.
//!
//! Stack frames are also used for promise long stack traces, where each
//! frame records the Rust call site that created a promise or chained a
//! callback onto it.

use std::fmt;
use std::panic::Location;

/// Represents a single frame in a call stack.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("then".to_string()),
///     source_url: Some("src/main.rs".to_string()),
///     line: 25,
///     column: 10,
/// };
///
/// assert_eq!(frame.to_string(), "then at src/main.rs:25:10");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for anonymous functions
    pub function_name: Option<String>,
    /// URL or file path of the source, or None if not available
    pub source_url: Option<String>,
    /// Line number where the call occurred
    pub line: u32,
    /// Column number where the call occurred
    pub column: u32,
}

impl StackFrame {
    /// Builds a frame from a caller location captured with `#[track_caller]`.
    pub fn from_location(label: &str, location: &Location<'_>) -> Self {
        Self {
            function_name: Some(label.to_string()),
            source_url: Some(location.file().to_string()),
            line: location.line(),
            column: location.column(),
        }
    }

    /// Builds a frame that carries only a descriptive label.
    pub fn annotation(text: impl Into<String>) -> Self {
        Self {
            function_name: Some(text.into()),
            source_url: None,
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<anonymous>");
        match &self.source_url {
            Some(url) => write!(f, "{} at {}:{}:{}", name, url, self.line, self.column),
            None => f.write_str(name),
        }
    }
}
