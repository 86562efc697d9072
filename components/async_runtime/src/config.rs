//! Runtime configuration.
//!
//! Settings can be built in code or parsed from JSON. Missing fields take
//! their default values.

use crate::error::RuntimeResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of released callback entries kept around for reuse.
pub const DEFAULT_MAX_UNUSED: usize = 100;

/// When and whether unhandled rejections are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionDelay {
    /// Reporting is turned off
    Disabled,
    /// Reported at the end of the current run-queue flush
    Immediate,
    /// Reported by a host timer after the delay
    After(Duration),
}

/// Configuration of a promise [`Runtime`](crate::Runtime).
///
/// # Examples
///
/// ```
/// use async_runtime::{RejectionDelay, RuntimeConfig};
///
/// let config = RuntimeConfig::from_json(r#"{ "unhandled_rejection_delay_ms": -1 }"#).unwrap();
/// assert_eq!(config.rejection_delay(), RejectionDelay::Disabled);
/// assert_eq!(config.max_unused_entries, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on pooled callback entries
    pub max_unused_entries: usize,
    /// Callback entries created up front
    pub initial_entries: usize,
    /// Delay before an unhandled rejection is reported; negative disables
    pub unhandled_rejection_delay_ms: i64,
    /// Record call sites of promise creation and chaining
    pub long_stack_traces: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_unused_entries: DEFAULT_MAX_UNUSED,
            initial_entries: 0,
            unhandled_rejection_delay_ms: 0,
            long_stack_traces: false,
        }
    }
}

impl RuntimeConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Interprets `unhandled_rejection_delay_ms`.
    pub fn rejection_delay(&self) -> RejectionDelay {
        match self.unhandled_rejection_delay_ms {
            ms if ms < 0 => RejectionDelay::Disabled,
            0 => RejectionDelay::Immediate,
            ms => RejectionDelay::After(Duration::from_millis(ms as u64)),
        }
    }
}
