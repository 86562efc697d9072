//! Small reusable data structures.
//!
//! - [`SimplePool`] - Bounded free list used to recycle short-lived objects
//! - [`LogBuffer`] - Ring buffer of the most recent log records
//! - [`BufferedLogger`] - `log` facade backend writing into a [`LogBuffer`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod log_buffer;
pub mod simple_pool;

pub use log_buffer::{BufferedLogger, LogBuffer, LogRecord};
pub use simple_pool::{PoolStats, SimplePool};
