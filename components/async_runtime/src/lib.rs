//! Cancellable promises on a cooperative event loop.
//!
//! This crate provides the asynchronous core of the runtime:
//! - Event loop with task, microtask and timer queues
//! - Cancellable promises with parent/child cancellation propagation
//! - Unhandled rejection reporting and long stack traces
//!
//! # Overview
//!
//! - [`EventLoop`] - Deterministic [`Host`] with a virtual clock
//! - [`Runtime`] - Shared promise state: run queue, entry pool, config
//! - [`Promise`] - The promise itself, plus combinators such as
//!   [`Promise::all`] and [`Promise::race`]
//!
//! Everything here is single-threaded. Handles are `Rc`-based and cheap to
//! clone.
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use async_runtime::{EventLoop, Task};
//! use core_types::Value;
//!
//! let event_loop = EventLoop::new();
//! event_loop.enqueue_task(Task::new(|| Ok(Value::Undefined)));
//! event_loop.run_until_done().unwrap();
//! ```
//!
//! ## Promise Usage
//!
//! ```
//! use async_runtime::{EventLoop, Handler, Promise, PromiseState, Runtime};
//! use core_types::Value;
//!
//! let event_loop = EventLoop::new();
//! let runtime = Runtime::new(event_loop.clone());
//!
//! let parent = Promise::pending(&runtime);
//! let child = parent.then(Some(Handler::new(Ok)), None, None);
//! child.cancel(Some("no longer needed"));
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(parent.state(), PromiseState::Rejected);
//! assert!(child.result().unwrap().is_cancellation());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod callback;
mod combinators;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod host;
pub mod promise;
mod resolution;
pub mod resolver;
pub mod runtime;
pub mod task_queue;

// Re-export main types at crate root
pub use callback::{Handler, HandlerResult};
pub use config::{RejectionDelay, RuntimeConfig, DEFAULT_MAX_UNUSED};
pub use error::{RuntimeError, RuntimeResult};
pub use event_loop::EventLoop;
pub use host::Host;
pub use promise::{Promise, PromiseState};
pub use resolver::{ResolveFn, Resolver};
pub use runtime::{RejectionHandler, Runtime};
pub use task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue, TimerId, TimerQueue};
