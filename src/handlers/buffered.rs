//! Buffered decorator: batches records before delivery

use crate::core::{Handler, Record, Result};

/// Decorator that accumulates records and delivers them to the wrapped
/// handler in batches.
///
/// The buffer drains exactly once when it reaches `capacity`, on `flush`, and
/// on `close`. The buffer is swapped out before delivery, so a wrapped
/// handler that logs during delivery cannot re-trigger the drain.
pub struct BufferedHandler {
    inner: Box<dyn Handler>,
    capacity: usize,
    buffer: Vec<Record>,
}

impl BufferedHandler {
    pub fn new(inner: Box<dyn Handler>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            capacity,
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn drain(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.buffer);
        self.inner.emit_batch(&batch)
    }
}

impl Handler for BufferedHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        self.buffer.push(record.clone());
        if self.buffer.len() >= self.capacity {
            self.drain()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.drain()?;
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        let drained = self.drain();
        let closed = self.inner.close();
        drained?;
        closed
    }

    fn name(&self) -> &str {
        "buffered"
    }
}
