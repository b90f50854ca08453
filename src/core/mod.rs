//! Core logger types and traits

pub mod error;
pub mod fields;
pub mod format;
pub mod handler;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod record;

pub use error::{Error, Result};
pub use fields::{FieldValue, Fields};
pub use format::{DateFormat, Formatter, LogFormat};
pub use handler::Handler;
pub use level::Level;
pub use logger::{existing_logger, get_rich_logger, LevelGuard, Logger, TimeScope};
pub use metrics::HandlerMetrics;
pub use record::Record;
