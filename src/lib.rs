//! # richlog
//!
//! Convenience layer for configuring rich, structured logging with minimal
//! ceremony: layered settings resolution, a process-wide named logger
//! registry, and composable handlers.
//!
//! ## Quick start
//!
//! ```no_run
//! use richlog::config::{Environment, Overrides, Settings};
//! use richlog::core::{get_rich_logger, Level};
//!
//! # fn main() -> richlog::core::Result<()> {
//! let settings = Settings::resolve(
//!     &Overrides::new().level(Level::Debug),
//!     None,
//!     &Environment::from_os(),
//! )?;
//! let logger = get_rich_logger("app", &settings);
//! logger.info("ready");
//! richlog::info!(logger, "listening on port {}", 8080);
//! # Ok(())
//! # }
//! ```
//!
//! ## Presets
//!
//! ```no_run
//! # fn main() -> richlog::core::Result<()> {
//! let logger = richlog::shortcuts::setup_with_preset("app", "development")?;
//! logger.debug("verbose console output");
//! # Ok(())
//! # }
//! ```
//!
//! ## Settings precedence
//!
//! Each field resolves independently, highest precedence first:
//!
//! 1. Explicit [`Overrides`](config::Overrides) passed in code
//! 2. `RICHLOG_*` environment variables
//! 3. A `[richlog]` section in a TOML or INI config file
//! 4. Built-in defaults
//!
//! ## Handlers
//!
//! Terminal handlers write records somewhere; decorators wrap another
//! handler. JSON output, async dispatch, and buffering are all decorators,
//! so they compose: a buffered JSON rotating-file chain is
//! `BufferedHandler(JsonHandler(RotatingFileHandler))`.

pub mod config;
pub mod core;
pub mod handlers;
pub mod macros;
pub mod shortcuts;

pub use config::{Environment, Overrides, RotationConfig, Settings};
pub use core::{
    existing_logger, get_rich_logger, DateFormat, Error, FieldValue, Fields, Formatter, Handler,
    Level, LogFormat, Logger, Record, Result,
};
pub use handlers::{
    AsyncHandler, BufferedHandler, ConsoleHandler, DrainReport, JsonHandler, OverflowPolicy,
    RotatingFileHandler,
};
pub use shortcuts::{
    setup_file_logger, setup_from_config, setup_json_logger, setup_with_preset, FileLoggerOptions,
    JsonLoggerOptions, Preset,
};

/// Common imports for library users
pub mod prelude {
    pub use crate::config::{Environment, Overrides, Settings};
    pub use crate::core::{get_rich_logger, Fields, Handler, Level, Logger, Record, Result};
    pub use crate::handlers::{
        AsyncHandler, BufferedHandler, ConsoleHandler, JsonHandler, RotatingFileHandler,
    };
    pub use crate::shortcuts::{
        setup_file_logger, setup_json_logger, setup_with_preset, Preset,
    };
}
