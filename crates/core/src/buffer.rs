//! Pending input writes.

use parking_lot::Mutex;
use simbridge_types::{PendingWrites, Value};

/// Input writes waiting for the next advance.
///
/// At most one value is pending per point; a later `set` replaces an
/// earlier one. [`flush`](Self::flush) takes everything in the same
/// critical section that clears it. A `set` racing a flush for the same
/// point lands either in the flushed batch or in the next one.
///
/// Once [`close`](Self::close)d the buffer accepts nothing more: no flush
/// will follow, so a write accepted then would never reach the simulation.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    pending: Mutex<Pending>,
}

#[derive(Debug, Default)]
struct Pending {
    writes: PendingWrites,
    closed: bool,
}

impl WriteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write, replacing any pending value for the same point.
    ///
    /// Returns false, dropping the write, when the buffer is closed.
    pub fn set(&self, point: impl Into<String>, value: Value) -> bool {
        self.set_all([(point.into(), value)])
    }

    /// Record several writes at once: either all are queued or, when the
    /// buffer is closed, none are.
    pub fn set_all(&self, writes: impl IntoIterator<Item = (String, Value)>) -> bool {
        let mut pending = self.pending.lock();
        if pending.closed {
            return false;
        }
        pending.writes.extend(writes);
        true
    }

    /// Take all pending writes, leaving the buffer empty.
    ///
    /// An empty result means no inputs for this cycle.
    pub fn flush(&self) -> PendingWrites {
        std::mem::take(&mut self.pending.lock().writes)
    }

    /// Refuse all further writes.
    pub fn close(&self) {
        self.pending.lock().closed = true;
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed
    }

    /// Number of points with a pending write.
    pub fn len(&self) -> usize {
        self.pending.lock().writes.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().writes.is_empty()
    }
}
