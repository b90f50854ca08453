//! One-call logger setup: presets and convenience constructors

use crate::config::{Environment, Overrides, RotationConfig, Settings};
use crate::core::{get_rich_logger, DateFormat, Error, Handler, Level, LogFormat, Logger, Result};
use crate::handlers::{BufferedHandler, ConsoleHandler, JsonHandler, RotatingFileHandler};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Named configuration bundles for common deployment shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Verbose console output for local work: DEBUG level, detailed format,
    /// rich tracebacks
    Development,
    /// Machine-readable output for deployments: INFO level, JSON lines into
    /// a rotating `<name>.log`
    Production,
    /// Terse output for test runs: DEBUG level, no timestamps
    Testing,
}

impl Preset {
    pub const NAMES: [&'static str; 3] = ["development", "production", "testing"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Development => "development",
            Preset::Production => "production",
            Preset::Testing => "testing",
        }
    }

    /// The settings this preset stands for
    pub fn settings(&self) -> Settings {
        match self {
            Preset::Development => Settings {
                level: Level::Debug,
                log_format: LogFormat::Detailed,
                date_format: DateFormat::Default,
                rich_tracebacks: true,
                ..Settings::default()
            },
            Preset::Production => Settings {
                level: Level::Info,
                log_format: LogFormat::Verbose,
                date_format: DateFormat::Iso8601,
                rich_tracebacks: false,
                ..Settings::default()
            },
            Preset::Testing => Settings {
                level: Level::Debug,
                log_format: LogFormat::Simple,
                date_format: DateFormat::Nothing,
                rich_tracebacks: true,
                ..Settings::default()
            },
        }
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Preset::Development),
            "production" | "prod" => Ok(Preset::Production),
            "testing" | "test" => Ok(Preset::Testing),
            other => Err(Error::unknown_preset(other, &Self::NAMES)),
        }
    }
}

/// Set up the named logger from a preset.
///
/// An unknown preset name is a configuration error and no logger is created
/// or reconfigured. The production preset writes JSON lines to a rotating
/// `<name>.log` in the working directory; the others log to the console.
pub fn setup_with_preset(name: &str, preset_name: &str) -> Result<Arc<Logger>> {
    let preset: Preset = preset_name.parse()?;
    let settings = preset.settings();
    let logger = get_rich_logger(name, &settings);

    if preset == Preset::Production {
        let file = RotatingFileHandler::from_settings(format!("{}.log", name), &settings)?;
        logger.replace_handlers(vec![Box::new(JsonHandler::new(Box::new(file)))]);
    }
    Ok(logger)
}

/// Set up the named logger from layered configuration: `RICHLOG_*`
/// environment variables, an optional config file (discovered in the working
/// directory when no path is given), and built-in defaults.
pub fn setup_from_config(name: &str, config_path: Option<&Path>) -> Result<Arc<Logger>> {
    let settings = Settings::resolve(&Overrides::new(), config_path, &Environment::from_os())?;
    Ok(get_rich_logger(name, &settings))
}

/// Options for [`setup_file_logger`]
#[derive(Debug, Clone)]
pub struct FileLoggerOptions {
    pub level: Level,
    /// Also mirror records to the console
    pub console: bool,
    pub rotation: RotationConfig,
}

impl Default for FileLoggerOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            console: true,
            rotation: RotationConfig::default(),
        }
    }
}

/// Set up the named logger writing formatted text to a rotating file,
/// optionally mirrored to the console.
pub fn setup_file_logger<P: AsRef<Path>>(
    name: &str,
    path: P,
    options: &FileLoggerOptions,
) -> Result<Arc<Logger>> {
    let settings = Settings {
        level: options.level,
        rotation: options.rotation.clone(),
        ..Settings::default()
    };
    let logger = get_rich_logger(name, &settings);

    let file = RotatingFileHandler::from_settings(path, &settings)?;
    let mut chain: Vec<Box<dyn Handler>> = vec![Box::new(file)];
    if options.console {
        chain.push(Box::new(ConsoleHandler::from_settings(&settings)));
    }
    logger.replace_handlers(chain);
    Ok(logger)
}

/// Options for [`setup_json_logger`]
#[derive(Debug, Clone)]
pub struct JsonLoggerOptions {
    pub level: Level,
    /// Batch this many records before writing, `None` for unbuffered
    pub buffer_capacity: Option<usize>,
    /// Also mirror records to the console as formatted text
    pub console: bool,
    pub rotation: RotationConfig,
}

impl Default for JsonLoggerOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            buffer_capacity: None,
            console: false,
            rotation: RotationConfig::default(),
        }
    }
}

/// Set up the named logger writing JSON lines to a rotating file.
pub fn setup_json_logger<P: AsRef<Path>>(
    name: &str,
    path: P,
    options: &JsonLoggerOptions,
) -> Result<Arc<Logger>> {
    let settings = Settings {
        level: options.level,
        rotation: options.rotation.clone(),
        ..Settings::default()
    };
    let logger = get_rich_logger(name, &settings);

    let file = RotatingFileHandler::from_settings(path, &settings)?;
    let mut json: Box<dyn Handler> = Box::new(JsonHandler::new(Box::new(file)));
    if let Some(capacity) = options.buffer_capacity {
        json = Box::new(BufferedHandler::new(json, capacity));
    }

    let mut chain: Vec<Box<dyn Handler>> = vec![json];
    if options.console {
        chain.push(Box::new(ConsoleHandler::from_settings(&settings)));
    }
    logger.replace_handlers(chain);
    Ok(logger)
}
