//! Shared state of the promise engine.
//!
//! A [`Runtime`] owns everything promises share: the host, the configuration,
//! the callback-entry pool, the run queue and the unhandled-rejection
//! handler. Tests create one runtime per test, so pools never leak state
//! across unrelated promises.

use crate::callback::CallbackEntry;
use crate::config::RuntimeConfig;
use crate::host::Host;
use crate::task_queue::MicroTask;
use core_types::Value;
use log::trace;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use structs::{PoolStats, SimplePool};

/// Callback invoked with the reason of an unhandled rejection.
pub type RejectionHandler = Rc<dyn Fn(&Value)>;

type Work = Box<dyn FnOnce()>;

#[derive(Default)]
struct RunQueue {
    work: VecDeque<Work>,
    flush_scheduled: bool,
}

struct RuntimeInner {
    host: Rc<dyn Host>,
    config: RuntimeConfig,
    pool: RefCell<SimplePool<Box<CallbackEntry>>>,
    run_queue: RefCell<RunQueue>,
    rejection_handler: RefCell<Option<RejectionHandler>>,
    next_promise_id: Cell<u64>,
}

/// Handle to a promise runtime. Clones share state.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Runtime};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let event_loop = EventLoop::new();
/// let runtime = Runtime::new(event_loop.clone());
///
/// let ran = Rc::new(Cell::new(false));
/// let r = ran.clone();
/// runtime.run(move || r.set(true));
/// assert!(!ran.get());
///
/// event_loop.run_all_microtasks().unwrap();
/// assert!(ran.get());
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    pub fn new<H: Host + 'static>(host: H) -> Self {
        Self::with_config(host, RuntimeConfig::default())
    }

    /// Creates a runtime with an explicit configuration.
    pub fn with_config<H: Host + 'static>(host: H, config: RuntimeConfig) -> Self {
        let pool = SimplePool::new(config.initial_entries, config.max_unused_entries, || {
            Box::new(CallbackEntry::default())
        })
        .with_reset(|entry: &mut Box<CallbackEntry>| entry.reset());

        Self {
            inner: Rc::new(RuntimeInner {
                host: Rc::new(host),
                config,
                pool: RefCell::new(pool),
                run_queue: RefCell::new(RunQueue::default()),
                rejection_handler: RefCell::new(None),
                next_promise_id: Cell::new(0),
            }),
        }
    }

    /// The configuration this runtime was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// The host this runtime schedules onto.
    pub fn host(&self) -> &dyn Host {
        self.inner.host.as_ref()
    }

    /// Queues `work` to run in the next flush.
    ///
    /// All work queued before the flush runs shares a single
    /// [`Host::schedule_soon`] call. Work queued while the flush is running
    /// joins the same flush.
    pub fn run<F>(&self, work: F)
    where
        F: FnOnce() + 'static,
    {
        let schedule = {
            let mut queue = self.inner.run_queue.borrow_mut();
            queue.work.push_back(Box::new(work));
            !std::mem::replace(&mut queue.flush_scheduled, true)
        };
        if schedule {
            trace!("scheduling run queue flush");
            let weak: Weak<RuntimeInner> = Rc::downgrade(&self.inner);
            self.inner.host.schedule_soon(MicroTask::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Runtime { inner }.flush();
                }
                Ok(Value::Undefined)
            }));
        }
    }

    /// Number of work items waiting for the next flush.
    pub fn pending_work(&self) -> usize {
        self.inner.run_queue.borrow().work.len()
    }

    /// Replaces the handler that receives unhandled rejection reasons.
    ///
    /// Without a handler, reasons go to [`Host::report_uncaught`].
    pub fn set_unhandled_rejection_handler<F>(&self, handler: F)
    where
        F: Fn(&Value) + 'static,
    {
        *self.inner.rejection_handler.borrow_mut() = Some(Rc::new(handler));
    }

    /// Pool counters for callback entries.
    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool.borrow().stats()
    }

    /// Callback entries currently waiting in the pool.
    pub fn pooled_entries(&self) -> usize {
        self.inner.pool.borrow().free_count()
    }

    pub(crate) fn handle_rejection(&self, reason: &Value) {
        let handler = self.inner.rejection_handler.borrow().clone();
        match handler {
            Some(handler) => handler(reason),
            None => self.inner.host.report_uncaught(reason),
        }
    }

    pub(crate) fn acquire_entry(&self) -> Box<CallbackEntry> {
        self.inner.pool.borrow_mut().get_object()
    }

    pub(crate) fn release_entry(&self, entry: Box<CallbackEntry>) {
        self.inner.pool.borrow_mut().release_object(entry);
    }

    pub(crate) fn next_promise_id(&self) -> u64 {
        let id = self.inner.next_promise_id.get();
        self.inner.next_promise_id.set(id + 1);
        id
    }

    fn flush(&self) {
        loop {
            let next = {
                let mut queue = self.inner.run_queue.borrow_mut();
                let next = queue.work.pop_front();
                if next.is_none() {
                    queue.flush_scheduled = false;
                }
                next
            };
            match next {
                Some(work) => work(),
                None => return,
            }
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("pending_work", &self.pending_work())
            .finish()
    }
}
