//! Built-in defaults and configuration conventions

use crate::core::level::Level;

pub const DEFAULT_LEVEL: Level = Level::Info;
pub const DEFAULT_RICH_TRACEBACKS: bool = true;

/// Default rotation sub-config: 10 MB per file, five backups
pub const DEFAULT_MAX_BYTES: u64 = 10_000_000;
pub const DEFAULT_BACKUP_COUNT: usize = 5;

/// The single recognized section/table in config files
pub const CONFIG_SECTION: &str = "richlog";

/// Conventional config filenames checked, in order, when no path is given.
/// Discovery stops at the first file that exists.
pub const CONFIG_FILE_CANDIDATES: &[&str] = &[
    "richlog.toml",
    "richlog.ini",
    ".richlog.toml",
    ".richlog.ini",
];

pub const ENV_LEVEL: &str = "RICHLOG_LEVEL";
pub const ENV_FORMAT: &str = "RICHLOG_FORMAT";
pub const ENV_DATE_FORMAT: &str = "RICHLOG_DATE_FORMAT";
pub const ENV_RICH_TRACEBACKS: &str = "RICHLOG_RICH_TRACEBACKS";
pub const ENV_TRACEBACK_SUPPRESS: &str = "RICHLOG_TRACEBACK_SUPPRESS";
