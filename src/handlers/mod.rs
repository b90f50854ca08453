//! Handler implementations
//!
//! Terminal handlers (`ConsoleHandler`, `RotatingFileHandler`) write records
//! somewhere; decorator handlers (`JsonHandler`, `AsyncHandler`,
//! `BufferedHandler`) wrap another handler and change how records reach it.

pub mod async_handler;
pub mod buffered;
pub mod console;
pub mod json;
pub mod rotating_file;

pub use async_handler::{AsyncHandler, DrainReport, OverflowPolicy, DEFAULT_DRAIN_TIMEOUT};
pub use buffered::BufferedHandler;
pub use console::ConsoleHandler;
pub use json::JsonHandler;
pub use rotating_file::RotatingFileHandler;
