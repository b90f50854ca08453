//! Named logger, process-wide registry, and the logger factory

use super::error::Result;
use super::fields::Fields;
use super::handler::Handler;
use super::level::Level;
use super::record::Record;
use crate::config::Settings;
use crate::handlers::ConsoleHandler;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Process-wide registry of named loggers.
///
/// This is deliberately global mutable state with process lifetime: the same
/// name always resolves to the same `Arc<Logger>`, mirroring the naming
/// registry of conventional logging runtimes.
static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<Logger>>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, Arc<Logger>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// A named logger owning a handler chain.
///
/// All state is behind locks so a logger can be shared freely across
/// threads via its registry `Arc`.
pub struct Logger {
    name: String,
    level: RwLock<Level>,
    // Mutex rather than RwLock: handlers take `&mut self` to emit, so every
    // access is exclusive anyway.
    handlers: Mutex<Vec<Box<dyn Handler>>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}

impl Logger {
    pub(crate) fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: RwLock::new(Level::default()),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        *self.level.read()
    }

    pub fn set_level(&self, level: Level) {
        *self.level.write() = level;
    }

    pub fn enabled_for(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Temporarily change the level; the previous level is restored when the
    /// returned guard drops.
    #[must_use = "the previous level is restored when the guard drops"]
    pub fn at_level(&self, level: Level) -> LevelGuard<'_> {
        let previous = self.level();
        self.set_level(level);
        LevelGuard {
            logger: self,
            previous,
        }
    }

    /// Append a handler to the chain
    pub fn add_handler(&self, handler: Box<dyn Handler>) {
        self.handlers.lock().push(handler);
    }

    /// Replace the whole handler chain.
    ///
    /// Previous handlers are closed first so buffered and queued records are
    /// delivered rather than dropped with the old chain.
    pub fn replace_handlers(&self, new_handlers: Vec<Box<dyn Handler>>) {
        let mut handlers = self.handlers.lock();
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.close() {
                eprintln!(
                    "[RICHLOG ERROR] handler '{}' failed to close on logger '{}': {}",
                    handler.name(),
                    self.name,
                    e
                );
            }
        }
        *handlers = new_handlers;
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        if !self.enabled_for(level) {
            return;
        }
        self.dispatch(Record::new(&self.name, level, message));
    }

    /// Log with a call-site location, used by the logging macros
    pub fn log_located(&self, level: Level, message: impl Into<String>, file: &str, line: u32) {
        if !self.enabled_for(level) {
            return;
        }
        self.dispatch(Record::new(&self.name, level, message).with_location(file, line));
    }

    /// Log with structured fields
    pub fn log_with_fields(&self, level: Level, message: impl Into<String>, fields: Fields) {
        if !self.enabled_for(level) {
            return;
        }
        self.dispatch(Record::new(&self.name, level, message).with_fields(fields));
    }

    /// Log an error with its source chain attached as exception info
    pub fn error_with_exception(
        &self,
        message: impl Into<String>,
        error: &(dyn std::error::Error + 'static),
    ) {
        if !self.enabled_for(Level::Error) {
            return;
        }
        let mut exc_info = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            exc_info.push_str("\ncaused by: ");
            exc_info.push_str(&cause.to_string());
            source = cause.source();
        }
        self.dispatch(Record::new(&self.name, Level::Error, message).with_exc_info(exc_info));
    }

    /// Time a scope of work: the returned guard logs
    /// `"<name> took <secs> seconds"` at `level` when it drops, so early
    /// returns and unwinding are covered too.
    #[must_use = "the duration is logged when the guard drops"]
    pub fn time_scope(&self, level: Level, name: impl Into<String>) -> TimeScope<'_> {
        TimeScope {
            logger: self,
            level,
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Run a fallible operation, logging its error (with the source chain
    /// attached) before handing it back to the caller.
    pub fn log_on_error<T, E>(
        &self,
        name: &str,
        op: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: std::error::Error + 'static,
    {
        match op() {
            Ok(value) => Ok(value),
            Err(e) => {
                self.error_with_exception(format!("error in {}: {}", name, e), &e);
                Err(e)
            }
        }
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    #[inline]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    /// Hand a record to every handler in the chain.
    ///
    /// Delivery errors are reported on stderr, never propagated: a logging
    /// failure must not take down the host application.
    fn dispatch(&self, record: Record) {
        let mut handlers = self.handlers.lock();
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.emit(&record) {
                eprintln!(
                    "[RICHLOG ERROR] handler '{}' failed on logger '{}': {}",
                    handler.name(),
                    self.name,
                    e
                );
            }
        }
    }

    /// Flush every handler; the first error is returned after all handlers
    /// were given the chance to flush.
    pub fn flush(&self) -> Result<()> {
        let mut handlers = self.handlers.lock();
        let mut first_err = None;
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.flush() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Close every handler, draining buffers and queues
    pub fn close(&self) -> Result<()> {
        let mut handlers = self.handlers.lock();
        let mut first_err = None;
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.close() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Apply settings to this logger: set the level and replace the handler
    /// chain with a console handler built from the settings. Replacing, not
    /// appending, is what keeps repeated configuration from stacking
    /// duplicate handlers.
    pub fn configure(&self, settings: &Settings) {
        self.set_level(settings.level);
        self.replace_handlers(vec![Box::new(ConsoleHandler::from_settings(settings))]);
    }
}

/// RAII guard logging the elapsed time of a scope on drop
pub struct TimeScope<'a> {
    logger: &'a Logger,
    level: Level,
    name: String,
    start: Instant,
}

impl Drop for TimeScope<'_> {
    fn drop(&mut self) {
        self.logger.log(
            self.level,
            format!(
                "{} took {:.4} seconds",
                self.name,
                self.start.elapsed().as_secs_f64()
            ),
        );
    }
}

/// RAII guard restoring a logger's previous level on drop
pub struct LevelGuard<'a> {
    logger: &'a Logger,
    previous: Level,
}

impl Drop for LevelGuard<'_> {
    fn drop(&mut self) {
        self.logger.set_level(self.previous);
    }
}

/// Get or create the process-wide logger for `name`, configured from
/// `settings`.
///
/// Idempotent on name: the same name always returns the same instance.
/// Calling again with different settings reconfigures that instance
/// (level and handler chain are replaced) instead of stacking handlers.
pub fn get_rich_logger(name: &str, settings: &Settings) -> Arc<Logger> {
    let logger = {
        let mut registry = registry().write();
        Arc::clone(
            registry
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Logger::bare(name))),
        )
    };
    logger.configure(settings);
    logger
}

/// Look up an already-configured logger without touching its configuration
pub fn existing_logger(name: &str) -> Option<Arc<Logger>> {
    registry().read().get(name).map(Arc::clone)
}
