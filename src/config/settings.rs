//! Settings resolution from code, environment, and config files
//!
//! Precedence per field, highest first: explicit override, `RICHLOG_*`
//! environment variable, config file value, built-in default. A field that
//! is present but empty at a higher-precedence source falls through to the
//! next source instead of short-circuiting to the default.

use super::defaults::{
    CONFIG_FILE_CANDIDATES, CONFIG_SECTION, DEFAULT_BACKUP_COUNT, DEFAULT_LEVEL, DEFAULT_MAX_BYTES,
    DEFAULT_RICH_TRACEBACKS, ENV_DATE_FORMAT, ENV_FORMAT, ENV_LEVEL, ENV_RICH_TRACEBACKS,
    ENV_TRACEBACK_SUPPRESS,
};
use crate::core::error::{Error, Result};
use crate::core::format::{DateFormat, LogFormat};
use crate::core::level::Level;
use crate::core::logger::{get_rich_logger, Logger};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Injected view of environment variables.
///
/// Production code uses [`Environment::from_os`]; tests build one from an
/// iterator so they never mutate process-wide env state. Empty values are
/// treated as unset so they fall through to the next precedence layer.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot the process environment
    pub fn from_os() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build from explicit key/value pairs
    pub fn from_iter<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// An environment with nothing set
    pub fn empty() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Explicit call-site overrides, the highest-precedence source
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub level: Option<Level>,
    pub log_format: Option<LogFormat>,
    pub date_format: Option<DateFormat>,
    pub rich_tracebacks: Option<bool>,
    pub traceback_suppress: Option<Vec<String>>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    #[must_use]
    pub fn date_format(mut self, format: DateFormat) -> Self {
        self.date_format = Some(format);
        self
    }

    #[must_use]
    pub fn rich_tracebacks(mut self, enabled: bool) -> Self {
        self.rich_tracebacks = Some(enabled);
        self
    }

    #[must_use]
    pub fn traceback_suppress(mut self, modules: Vec<String>) -> Self {
        self.traceback_suppress = Some(modules);
        self
    }
}

/// Rotation sub-config consumed by the rotating file handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    pub max_bytes: u64,
    pub backup_count: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
        }
    }
}

/// Resolved, validated, immutable settings.
///
/// Only the resolver constructs these from layered sources; afterwards they
/// are read-only input to the logger factory and the shortcuts.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub level: Level,
    pub log_format: LogFormat,
    pub date_format: DateFormat,
    pub rich_tracebacks: bool,
    pub traceback_suppress: Vec<String>,
    pub rotation: RotationConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            log_format: LogFormat::default(),
            date_format: DateFormat::default(),
            rich_tracebacks: DEFAULT_RICH_TRACEBACKS,
            traceback_suppress: Vec::new(),
            rotation: RotationConfig::default(),
        }
    }
}

/// Raw values from one config file, before validation.
///
/// Unknown keys are ignored by construction: serde skips them for TOML and
/// the INI loader only looks at recognized keys.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileValues {
    level: Option<String>,
    format: Option<String>,
    date_format: Option<String>,
    rich_tracebacks: Option<bool>,
    traceback_suppress: Option<Vec<String>>,
}

impl Settings {
    /// Resolve settings from explicit overrides, an optional config file,
    /// and an environment snapshot.
    ///
    /// When `config_path` is `None`, the conventional filenames in
    /// [`CONFIG_FILE_CANDIDATES`] are probed in the working directory;
    /// finding none is not an error. An explicitly given path must exist
    /// and parse.
    pub fn resolve(
        overrides: &Overrides,
        config_path: Option<&Path>,
        env: &Environment,
    ) -> Result<Settings> {
        let file = match config_path {
            Some(path) => Some(load_config_file(path)?),
            None => match discover_config_file(Path::new(".")) {
                Some(path) => Some(load_config_file(&path)?),
                None => None,
            },
        };
        Self::resolve_layers(overrides, file.unwrap_or_default(), env)
    }

    fn resolve_layers(overrides: &Overrides, file: FileValues, env: &Environment) -> Result<Settings> {
        let level = match &overrides.level {
            Some(level) => *level,
            None => match env.get(ENV_LEVEL).or(nonempty(&file.level)) {
                Some(s) => s
                    .parse::<Level>()
                    .map_err(|e| Error::config("level", e))?,
                None => DEFAULT_LEVEL,
            },
        };

        let log_format = match &overrides.log_format {
            Some(format) => format.clone(),
            None => match env.get(ENV_FORMAT).or(nonempty(&file.format)) {
                Some(s) => LogFormat::parse(s)?,
                None => LogFormat::default(),
            },
        };

        let date_format = match &overrides.date_format {
            Some(format) => format.clone(),
            None => match env.get(ENV_DATE_FORMAT).or(nonempty(&file.date_format)) {
                Some(s) => DateFormat::parse(s)?,
                None => DateFormat::default(),
            },
        };

        let rich_tracebacks = match overrides.rich_tracebacks {
            Some(enabled) => enabled,
            None => match env.get(ENV_RICH_TRACEBACKS) {
                Some(s) => parse_bool(s).map_err(|e| Error::config("rich_tracebacks", e))?,
                None => file.rich_tracebacks.unwrap_or(DEFAULT_RICH_TRACEBACKS),
            },
        };

        let traceback_suppress = match &overrides.traceback_suppress {
            Some(modules) if !modules.is_empty() => modules.clone(),
            _ => match env.get(ENV_TRACEBACK_SUPPRESS).map(parse_list) {
                Some(modules) if !modules.is_empty() => modules,
                _ => match &file.traceback_suppress {
                    Some(modules) if !modules.is_empty() => modules.clone(),
                    _ => Vec::new(),
                },
            },
        };

        Ok(Settings {
            level,
            log_format,
            date_format,
            rich_tracebacks,
            traceback_suppress,
            rotation: RotationConfig::default(),
        })
    }

    /// Create (or reconfigure) the named logger from these settings
    pub fn create_logger(&self, name: &str) -> Arc<Logger> {
        get_rich_logger(name, self)
    }

    /// Serialize the recognized config keys back to a TOML document with a
    /// single `[richlog]` table
    pub fn to_toml_string(&self) -> String {
        let mut section = toml::value::Table::new();
        section.insert(
            "level".to_string(),
            toml::Value::String(self.level.to_str().to_string()),
        );
        section.insert(
            "format".to_string(),
            toml::Value::String(self.log_format.config_value().to_string()),
        );
        section.insert(
            "date_format".to_string(),
            toml::Value::String(self.date_format.config_value().to_string()),
        );
        section.insert(
            "rich_tracebacks".to_string(),
            toml::Value::Boolean(self.rich_tracebacks),
        );
        section.insert(
            "traceback_suppress".to_string(),
            toml::Value::Array(
                self.traceback_suppress
                    .iter()
                    .map(|m| toml::Value::String(m.clone()))
                    .collect(),
            ),
        );

        let mut root = toml::value::Table::new();
        root.insert(CONFIG_SECTION.to_string(), toml::Value::Table(section));
        toml::to_string(&toml::Value::Table(root)).unwrap_or_default()
    }
}

fn nonempty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Parse a boolean from its textual config forms.
///
/// Anything outside the recognized set is a configuration error, not a
/// silent false.
fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!(
            "expected a boolean (true/false/1/0/yes/no), got '{}'",
            other
        )),
    }
}

/// Split a comma-separated list, dropping empty entries
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Probe the conventional config filenames in `dir`; first hit wins
pub fn discover_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load one config file, choosing the parser by extension: `.toml` selects
/// TOML, anything else the INI parser.
fn load_config_file(path: &Path) -> Result<FileValues> {
    if !path.is_file() {
        return Err(Error::config_file(
            path.display().to_string(),
            "file not found",
        ));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::config_file(path.display().to_string(), format!("cannot read: {}", e))
    })?;

    if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        load_toml(path, &contents)
    } else {
        load_ini(path, &contents)
    }
}

fn load_toml(path: &Path, contents: &str) -> Result<FileValues> {
    let root: toml::Value = contents.parse().map_err(|e: toml::de::Error| {
        Error::config_file(path.display().to_string(), format!("invalid TOML: {}", e))
    })?;

    match root.get(CONFIG_SECTION) {
        Some(section) => section.clone().try_into().map_err(|e: toml::de::Error| {
            Error::config_file(
                path.display().to_string(),
                format!("invalid [{}] table: {}", CONFIG_SECTION, e),
            )
        }),
        None => Ok(FileValues::default()),
    }
}

/// Minimal INI reader for the single recognized `[richlog]` section.
///
/// Lines are `key = value`; `#` and `;` start comments; unknown keys are
/// ignored; `traceback_suppress` is comma-separated.
fn load_ini(path: &Path, contents: &str) -> Result<FileValues> {
    let mut values = FileValues::default();
    let mut in_section = false;

    for (lineno, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = section.trim() == CONFIG_SECTION;
            continue;
        }
        // Content in unrecognized sections is ignored wholesale, malformed
        // lines included.
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::config_file(
                path.display().to_string(),
                format!("invalid INI syntax on line {}: '{}'", lineno + 1, line),
            ));
        };
        let key = key.trim();
        let value = value.trim().to_string();
        match key {
            "level" => values.level = Some(value),
            "format" => values.format = Some(value),
            "date_format" => values.date_format = Some(value),
            "rich_tracebacks" => {
                values.rich_tracebacks =
                    Some(parse_bool(&value).map_err(|e| Error::config("rich_tracebacks", e))?);
            }
            "traceback_suppress" => values.traceback_suppress = Some(parse_list(&value)),
            // Unknown keys are ignored, not errors
            _ => {}
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_with_empty_sources() {
        let settings =
            Settings::resolve_layers(&Overrides::new(), FileValues::default(), &Environment::empty())
                .unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_env_beats_file() {
        let file = FileValues {
            level: Some("ERROR".into()),
            ..Default::default()
        };
        let env = Environment::from_iter([(ENV_LEVEL, "DEBUG")]);
        let settings = Settings::resolve_layers(&Overrides::new(), file, &env).unwrap();
        assert_eq!(settings.level, Level::Debug);
    }

    #[test]
    fn test_explicit_beats_env() {
        let env = Environment::from_iter([(ENV_LEVEL, "DEBUG")]);
        let overrides = Overrides::new().level(Level::Critical);
        let settings =
            Settings::resolve_layers(&overrides, FileValues::default(), &env).unwrap();
        assert_eq!(settings.level, Level::Critical);
    }

    #[test]
    fn test_empty_env_value_falls_through() {
        let file = FileValues {
            level: Some("WARNING".into()),
            ..Default::default()
        };
        let env = Environment::from_iter([(ENV_LEVEL, "  ")]);
        let settings = Settings::resolve_layers(&Overrides::new(), file, &env).unwrap();
        assert_eq!(settings.level, Level::Warning);
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        let env = Environment::from_iter([(ENV_LEVEL, "LOUD")]);
        let err =
            Settings::resolve_layers(&Overrides::new(), FileValues::default(), &env).unwrap_err();
        assert!(matches!(err, Error::Config { ref field, .. } if field == "level"));
    }

    #[test]
    fn test_malformed_boolean_is_config_error() {
        let env = Environment::from_iter([(ENV_RICH_TRACEBACKS, "maybe")]);
        let err =
            Settings::resolve_layers(&Overrides::new(), FileValues::default(), &env).unwrap_err();
        assert!(matches!(err, Error::Config { ref field, .. } if field == "rich_tracebacks"));
    }

    #[test]
    fn test_boolean_forms() {
        for truthy in ["true", "TRUE", "1", "yes", "On"] {
            assert!(parse_bool(truthy).unwrap());
        }
        for falsy in ["false", "0", "No", "off"] {
            assert!(!parse_bool(falsy).unwrap());
        }
        assert!(parse_bool("2").is_err());
    }

    #[test]
    fn test_env_suppress_list() {
        let env = Environment::from_iter([(ENV_TRACEBACK_SUPPRESS, "tokio, hyper ,,")]);
        let settings =
            Settings::resolve_layers(&Overrides::new(), FileValues::default(), &env).unwrap();
        assert_eq!(settings.traceback_suppress, vec!["tokio", "hyper"]);
    }

    #[test]
    fn test_toml_file_values() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "richlog.toml",
            r#"
[richlog]
level = "DEBUG"
format = "VERBOSE"
date_format = "ISO8601"
rich_tracebacks = false
traceback_suppress = ["tokio", "hyper"]
ignored_key = "no problem"
"#,
        );

        let settings =
            Settings::resolve(&Overrides::new(), Some(&path), &Environment::empty()).unwrap();
        assert_eq!(settings.level, Level::Debug);
        assert_eq!(settings.log_format, LogFormat::Verbose);
        assert_eq!(
            settings.log_format.template(),
            "%(asctime)s - %(name)s - %(levelname)s - %(message)s"
        );
        assert_eq!(settings.date_format, DateFormat::Iso8601);
        assert!(!settings.rich_tracebacks);
        assert_eq!(settings.traceback_suppress, vec!["tokio", "hyper"]);
    }

    #[test]
    fn test_ini_file_values() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "richlog.ini",
            "\
# comment
[richlog]
level = WARNING
format = SIMPLE
rich_tracebacks = yes
traceback_suppress = tokio, hyper
unknown = ignored

[other]
level = DEBUG
",
        );

        let settings =
            Settings::resolve(&Overrides::new(), Some(&path), &Environment::empty()).unwrap();
        assert_eq!(settings.level, Level::Warning);
        assert_eq!(settings.log_format, LogFormat::Simple);
        assert!(settings.rich_tracebacks);
        assert_eq!(settings.traceback_suppress, vec!["tokio", "hyper"]);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Settings::resolve(
            &Overrides::new(),
            Some(Path::new("/nonexistent/richlog.toml")),
            &Environment::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "richlog.toml", "[richlog\nlevel = ");
        let err =
            Settings::resolve(&Overrides::new(), Some(&path), &Environment::empty()).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }

    #[test]
    fn test_invalid_ini_line_is_error() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "richlog.ini", "[richlog]\nthis is not a pair\n");
        let err =
            Settings::resolve(&Overrides::new(), Some(&path), &Environment::empty()).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }

    #[test]
    fn test_ini_ignores_malformed_lines_in_other_sections() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "richlog.ini",
            "\
[alembic]
not a key value pair at all

[richlog]
level = ERROR
",
        );
        let settings =
            Settings::resolve(&Overrides::new(), Some(&path), &Environment::empty()).unwrap();
        assert_eq!(settings.level, Level::Error);
    }

    #[test]
    fn test_discovery_order_first_wins() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "richlog.toml", "[richlog]\nlevel = \"DEBUG\"\n");
        write_file(dir.path(), "richlog.ini", "[richlog]\nlevel = ERROR\n");

        let found = discover_config_file(dir.path()).unwrap();
        assert!(found.ends_with("richlog.toml"));
    }

    #[test]
    fn test_discovery_none_is_ok() {
        let dir = tempdir().unwrap();
        assert!(discover_config_file(dir.path()).is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "richlog.toml",
            r#"
[richlog]
level = "ERROR"
format = "DETAILED"
date_format = "EU"
rich_tracebacks = true
traceback_suppress = ["serde"]
"#,
        );

        let settings =
            Settings::resolve(&Overrides::new(), Some(&path), &Environment::empty()).unwrap();

        let round_trip = write_file(dir.path(), "round_trip.toml", &settings.to_toml_string());
        let reparsed =
            Settings::resolve(&Overrides::new(), Some(&round_trip), &Environment::empty()).unwrap();
        assert_eq!(settings, reparsed);
    }

    #[test]
    fn test_custom_template_from_file() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "richlog.toml",
            "[richlog]\nformat = \"%(levelname)s :: %(message)s\"\n",
        );
        let settings =
            Settings::resolve(&Overrides::new(), Some(&path), &Environment::empty()).unwrap();
        assert_eq!(
            settings.log_format,
            LogFormat::Custom("%(levelname)s :: %(message)s".to_string())
        );
    }
}
