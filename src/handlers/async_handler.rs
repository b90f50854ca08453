//! Async decorator: off-thread delivery through a channel-fed worker

use crate::core::{Error, Handler, HandlerMetrics, Record, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default time budget for draining queued records on close
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What `emit` does when a bounded queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait until the worker makes room
    #[default]
    Block,
    /// Drop the incoming record and count it as lost
    DropNewest,
    /// Return `Error::QueueFull` to the caller
    Raise,
}

/// Outcome of draining the queue on close
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: u64,
    pub lost: u64,
    pub timed_out: bool,
}

enum Message {
    Record(Record),
    Flush(Sender<()>),
}

/// Decorator that moves delivery onto a dedicated worker thread.
///
/// `emit` enqueues and returns immediately; a single worker drains the
/// channel in order, so downstream handlers observe records in emit order.
/// Closing the sender side shuts the worker down after it finishes the
/// backlog, unless `discard_on_close` is set or the drain times out.
pub struct AsyncHandler {
    sender: Option<Sender<Message>>,
    worker: Option<JoinHandle<()>>,
    policy: OverflowPolicy,
    capacity: Option<usize>,
    metrics: Arc<HandlerMetrics>,
    discard_flag: Arc<AtomicBool>,
    discard_on_close: bool,
    drain_timeout: Duration,
    inner_name: String,
}

impl AsyncHandler {
    /// Wrap `inner` behind a bounded queue of `capacity` records
    pub fn new(inner: Box<dyn Handler>, capacity: usize) -> Result<Self> {
        Self::build(inner, Some(capacity))
    }

    /// Wrap `inner` behind an unbounded queue
    pub fn unbounded(inner: Box<dyn Handler>) -> Result<Self> {
        Self::build(inner, None)
    }

    fn build(inner: Box<dyn Handler>, capacity: Option<usize>) -> Result<Self> {
        let (sender, receiver) = match capacity {
            Some(n) => bounded(n.max(1)),
            None => unbounded(),
        };
        let metrics = Arc::new(HandlerMetrics::new());
        let discard_flag = Arc::new(AtomicBool::new(false));
        let inner_name = inner.name().to_string();

        let worker = thread::Builder::new()
            .name(format!("richlog-async-{}", inner_name))
            .spawn({
                let metrics = Arc::clone(&metrics);
                let discard_flag = Arc::clone(&discard_flag);
                move || Self::worker_loop(inner, receiver, metrics, discard_flag)
            })
            .map_err(|e| {
                Error::io_operation(
                    "spawning async worker",
                    format!("cannot start delivery thread for '{}'", inner_name),
                    e,
                )
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            policy: OverflowPolicy::default(),
            capacity,
            metrics,
            discard_flag,
            discard_on_close: false,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            inner_name,
        })
    }

    #[must_use]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Drop the backlog instead of draining it when the handler closes
    #[must_use]
    pub fn with_discard_on_close(mut self, discard: bool) -> Self {
        self.discard_on_close = discard;
        self
    }

    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn metrics(&self) -> &HandlerMetrics {
        &self.metrics
    }

    fn worker_loop(
        mut inner: Box<dyn Handler>,
        receiver: Receiver<Message>,
        metrics: Arc<HandlerMetrics>,
        discard_flag: Arc<AtomicBool>,
    ) {
        while let Ok(message) = receiver.recv() {
            match message {
                Message::Record(record) => {
                    if discard_flag.load(Ordering::Relaxed) {
                        metrics.record_dropped();
                        continue;
                    }
                    match inner.emit(&record) {
                        Ok(()) => metrics.record_delivered(),
                        Err(e) => {
                            metrics.record_dropped();
                            eprintln!(
                                "[RICHLOG ERROR] async delivery to '{}' failed: {}",
                                inner.name(),
                                e
                            );
                        }
                    }
                }
                Message::Flush(ack) => {
                    if let Err(e) = inner.flush() {
                        eprintln!(
                            "[RICHLOG ERROR] async flush of '{}' failed: {}",
                            inner.name(),
                            e
                        );
                    }
                    let _ = ack.send(());
                }
            }
        }

        if let Err(e) = inner.close() {
            eprintln!(
                "[RICHLOG ERROR] async close of '{}' failed: {}",
                inner.name(),
                e
            );
        }
    }

    /// Stop accepting records and wait up to `timeout` for the worker to
    /// finish the backlog.
    ///
    /// On timeout the worker keeps running detached and the report counts
    /// the undelivered records as lost.
    pub fn close_with_timeout(&mut self, timeout: Duration) -> DrainReport {
        if self.discard_on_close {
            self.discard_flag.store(true, Ordering::Relaxed);
        }
        drop(self.sender.take());

        if let Some(handle) = self.worker.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    let _ = handle.join();
                    break;
                }
                if start.elapsed() >= timeout {
                    let lost = self.metrics.pending();
                    eprintln!(
                        "[RICHLOG WARNING] async handler for '{}' did not drain within {:?}, {} records lost",
                        self.inner_name, timeout, lost
                    );
                    return DrainReport {
                        delivered: self.metrics.delivered(),
                        lost,
                        timed_out: true,
                    };
                }
                thread::sleep(SHUTDOWN_POLL_INTERVAL);
            }
        }

        DrainReport {
            delivered: self.metrics.delivered(),
            lost: self.metrics.dropped(),
            timed_out: false,
        }
    }
}

impl Handler for AsyncHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::HandlerClosed(self.name().to_string()))?;

        match sender.try_send(Message::Record(record.clone())) {
            Ok(()) => {
                self.metrics.record_enqueued();
                Ok(())
            }
            Err(TrySendError::Full(message)) => match self.policy {
                OverflowPolicy::Block => {
                    sender
                        .send(message)
                        .map_err(|_| Error::HandlerClosed(self.name().to_string()))?;
                    self.metrics.record_enqueued();
                    Ok(())
                }
                OverflowPolicy::DropNewest => {
                    self.metrics.record_enqueued();
                    self.metrics.record_dropped();
                    Ok(())
                }
                OverflowPolicy::Raise => Err(Error::QueueFull {
                    capacity: self.capacity.unwrap_or(0),
                }),
            },
            Err(TrySendError::Disconnected(_)) => {
                Err(Error::HandlerClosed(self.name().to_string()))
            }
        }
    }

    /// Synchronous barrier: waits until the worker has delivered everything
    /// enqueued before this call and flushed the wrapped handler.
    fn flush(&mut self) -> Result<()> {
        let sender = match self.sender.as_ref() {
            Some(sender) => sender,
            None => return Ok(()),
        };

        let (ack_tx, ack_rx) = bounded(1);
        sender
            .send(Message::Flush(ack_tx))
            .map_err(|_| Error::HandlerClosed(self.name().to_string()))?;
        ack_rx
            .recv_timeout(self.drain_timeout)
            .map_err(|_| Error::writer("async flush timed out"))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.close_with_timeout(self.drain_timeout);
        Ok(())
    }

    fn name(&self) -> &str {
        "async"
    }
}

impl Drop for AsyncHandler {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.close_with_timeout(self.drain_timeout);
        }
    }
}
