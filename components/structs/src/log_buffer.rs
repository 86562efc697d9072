//! A fixed-capacity ring buffer of log records.
//!
//! Once the buffer is full, each new record overwrites the oldest one.
//! [`BufferedLogger`] plugs the buffer into the `log` facade so diagnostics
//! emitted by the engine can be inspected in-process.

use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::sync::Arc;

/// A single buffered log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity
    pub level: Level,
    /// Formatted message
    pub message: String,
    /// Name of the logger (the `log` target)
    pub logger_name: String,
    /// Monotonic sequence number, never reset by wrap-around
    pub sequence: u64,
}

/// Ring buffer of the most recent `capacity` records.
///
/// A capacity of zero disables buffering: records are still built and
/// returned but nothing is retained.
///
/// ```
/// use log::Level;
/// use structs::LogBuffer;
///
/// let mut buffer = LogBuffer::new(2);
/// buffer.add_record(Level::Info, "a", "test");
/// buffer.add_record(Level::Info, "b", "test");
/// buffer.add_record(Level::Warn, "c", "test");
///
/// let mut seen = Vec::new();
/// buffer.for_each_record(|r| seen.push(r.message.clone()));
/// assert_eq!(seen, ["b", "c"]);
/// ```
#[derive(Debug)]
pub struct LogBuffer {
    records: Vec<LogRecord>,
    capacity: usize,
    next: usize,
    sequence: u64,
}

impl LogBuffer {
    /// Creates an empty buffer holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            sequence: 0,
        }
    }

    /// Whether records are retained at all.
    pub fn is_buffering_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Adds a record, evicting the oldest one when full.
    pub fn add_record(&mut self, level: Level, message: &str, logger_name: &str) -> LogRecord {
        let record = LogRecord {
            level,
            message: message.to_string(),
            logger_name: logger_name.to_string(),
            sequence: self.sequence,
        };
        self.sequence += 1;

        if !self.is_buffering_enabled() {
            return record;
        }
        if self.records.len() < self.capacity {
            self.records.push(record.clone());
        } else {
            self.records[self.next] = record.clone();
        }
        self.next = (self.next + 1) % self.capacity;
        record
    }

    /// Removes every record. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next = 0;
    }

    /// Visits records from oldest to newest.
    pub fn for_each_record<F>(&self, mut f: F)
    where
        F: FnMut(&LogRecord),
    {
        let (newer, older) = if self.is_full() {
            self.records.split_at(self.next)
        } else {
            (&self.records[..], &[][..])
        };
        older.iter().chain(newer.iter()).for_each(&mut f);
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no record is retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once the buffer has wrapped.
    pub fn is_full(&self) -> bool {
        self.is_buffering_enabled() && self.records.len() == self.capacity
    }

    /// Maximum number of retained records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A `log::Log` implementation that writes into a shared [`LogBuffer`].
#[derive(Debug, Clone)]
pub struct BufferedLogger {
    buffer: Arc<Mutex<LogBuffer>>,
    level: LevelFilter,
}

impl BufferedLogger {
    /// Creates a logger with its own buffer of `capacity` records.
    pub fn new(capacity: usize, level: LevelFilter) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(LogBuffer::new(capacity))),
            level,
        }
    }

    /// Shared handle to the underlying buffer.
    pub fn buffer(&self) -> Arc<Mutex<LogBuffer>> {
        Arc::clone(&self.buffer)
    }

    /// Messages currently buffered, oldest first.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.buffer
            .lock()
            .for_each_record(|r| out.push(r.message.clone()));
        out
    }
}

impl Log for BufferedLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        self.buffer
            .lock()
            .add_record(record.level(), &message, record.target());
    }

    fn flush(&self) {}
}
