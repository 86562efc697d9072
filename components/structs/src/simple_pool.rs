//! A bounded free list of reusable objects.
//!
//! The pool does not track objects that are in use. Released objects are
//! reset and kept for reuse while the free list is below its maximum size;
//! beyond that they are dropped.
//!
//! Objects that hold closures or references must be cleared by the reset
//! hook, otherwise a pooled object keeps unrelated data alive until it is
//! reused.

use std::fmt;

/// Running totals for a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects built by the factory
    pub created: usize,
    /// Objects handed out from the free list
    pub reused: usize,
    /// Released objects dropped because the free list was full
    pub discarded: usize,
}

/// A generic object pool.
///
/// # Examples
///
/// ```
/// use structs::SimplePool;
///
/// let mut pool = SimplePool::new(0, 2, Vec::<u8>::new).with_reset(|v: &mut Vec<u8>| v.clear());
///
/// let mut buf = pool.get_object();
/// buf.push(1);
/// pool.release_object(buf);
///
/// let buf = pool.get_object();
/// assert!(buf.is_empty());
/// assert_eq!(pool.stats().reused, 1);
/// ```
pub struct SimplePool<T> {
    free: Vec<T>,
    max_count: usize,
    create: Box<dyn Fn() -> T>,
    reset: Option<Box<dyn Fn(&mut T)>>,
    stats: PoolStats,
}

impl<T> SimplePool<T> {
    /// Creates a pool pre-populated with `initial_count` objects.
    ///
    /// `initial_count` is clamped to `max_count`.
    pub fn new<F>(initial_count: usize, max_count: usize, create: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let mut pool = Self {
            free: Vec::with_capacity(initial_count.min(max_count)),
            max_count,
            create: Box::new(create),
            reset: None,
            stats: PoolStats::default(),
        };
        pool.create_initial(initial_count.min(max_count));
        pool
    }

    /// Sets the hook that clears an object when it is released.
    pub fn with_reset<R>(mut self, reset: R) -> Self
    where
        R: Fn(&mut T) + 'static,
    {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Gets an unused object from the pool, or creates a new one.
    pub fn get_object(&mut self) -> T {
        match self.free.pop() {
            Some(obj) => {
                self.stats.reused += 1;
                obj
            }
            None => self.create_object(),
        }
    }

    /// Returns an object to the pool. If the pool is already full the object
    /// is dropped instead.
    pub fn release_object(&mut self, mut obj: T) {
        if let Some(reset) = &self.reset {
            reset(&mut obj);
        }
        if self.free.len() < self.max_count {
            self.free.push(obj);
        } else {
            self.stats.discarded += 1;
        }
    }

    /// Number of objects currently available for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Maximum number of objects kept in the free list.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Running totals.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drops every pooled object.
    pub fn clear(&mut self) {
        self.free.clear();
    }

    fn create_object(&mut self) -> T {
        self.stats.created += 1;
        (self.create)()
    }

    fn create_initial(&mut self, initial_count: usize) {
        for _ in 0..initial_count {
            let obj = self.create_object();
            self.free.push(obj);
        }
    }
}

impl<T> fmt::Debug for SimplePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplePool")
            .field("free", &self.free.len())
            .field("max_count", &self.max_count)
            .field("stats", &self.stats)
            .finish()
    }
}
