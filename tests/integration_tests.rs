//! End-to-end tests across settings resolution, the logger registry, and
//! handler chains.
//!
//! Logger names are unique per test because the registry is process-wide.

use richlog::config::{Environment, Overrides, Settings};
use richlog::core::{
    existing_logger, get_rich_logger, Error, Handler, Level, LogFormat, Record, Result,
};
use richlog::handlers::{
    AsyncHandler, BufferedHandler, JsonHandler, RotatingFileHandler,
};
use richlog::shortcuts::{setup_json_logger, setup_with_preset, JsonLoggerOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const ENV_LEVEL: &str = "RICHLOG_LEVEL";

fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Test handler recording messages and batch boundaries
struct Capture {
    messages: Arc<Mutex<Vec<String>>>,
    batches: Arc<Mutex<Vec<usize>>>,
}

impl Capture {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<usize>>>) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let batches = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                messages: Arc::clone(&messages),
                batches: Arc::clone(&batches),
            },
            messages,
            batches,
        )
    }
}

impl Handler for Capture {
    fn emit(&mut self, record: &Record) -> Result<()> {
        self.messages.lock().unwrap().push(record.message.clone());
        self.batches.lock().unwrap().push(1);
        Ok(())
    }

    fn emit_batch(&mut self, records: &[Record]) -> Result<()> {
        let mut messages = self.messages.lock().unwrap();
        for record in records {
            messages.push(record.message.clone());
        }
        self.batches.lock().unwrap().push(records.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "capture"
    }
}

#[test]
fn precedence_explicit_beats_env_beats_file_beats_default() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "richlog.toml", "[richlog]\nlevel = \"WARNING\"\n");
    let env = Environment::from_iter([(ENV_LEVEL, "ERROR")]);

    // All four layers defined: explicit wins.
    let settings = Settings::resolve(
        &Overrides::new().level(Level::Critical),
        Some(&config),
        &env,
    )
    .unwrap();
    assert_eq!(settings.level, Level::Critical);

    // No explicit: env wins over file.
    let settings = Settings::resolve(&Overrides::new(), Some(&config), &env).unwrap();
    assert_eq!(settings.level, Level::Error);

    // No explicit, no env: file wins over default.
    let settings =
        Settings::resolve(&Overrides::new(), Some(&config), &Environment::empty()).unwrap();
    assert_eq!(settings.level, Level::Warning);

    // Nothing defined anywhere: built-in default.
    let empty = write_config(dir.path(), "empty.toml", "[richlog]\n");
    let settings =
        Settings::resolve(&Overrides::new(), Some(&empty), &Environment::empty()).unwrap();
    assert_eq!(settings.level, Level::Info);
}

#[test]
fn env_level_debug_resolves_debug() {
    let env = Environment::from_iter([(ENV_LEVEL, "DEBUG")]);
    let dir = TempDir::new().unwrap();
    let empty = write_config(dir.path(), "richlog.toml", "[richlog]\n");
    let settings = Settings::resolve(&Overrides::new(), Some(&empty), &env).unwrap();
    assert_eq!(settings.level, Level::Debug);
}

#[test]
fn file_verbose_format_resolves_exact_template() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "richlog.toml", "[richlog]\nformat = \"VERBOSE\"\n");
    let settings =
        Settings::resolve(&Overrides::new(), Some(&config), &Environment::empty()).unwrap();
    assert_eq!(settings.log_format, LogFormat::Verbose);
    assert_eq!(
        settings.log_format.template(),
        "%(asctime)s - %(name)s - %(levelname)s - %(message)s"
    );
}

#[test]
fn buffered_handler_flush_and_capacity_trigger() {
    let (capture, messages, batches) = Capture::new();
    let mut buffered = BufferedHandler::new(Box::new(capture), 5);

    // Below capacity: nothing delivered until the explicit flush.
    for i in 0..3 {
        buffered
            .emit(&Record::new("it.buffered", Level::Info, format!("msg {}", i)))
            .unwrap();
    }
    assert!(messages.lock().unwrap().is_empty());
    buffered.flush().unwrap();
    assert_eq!(
        *messages.lock().unwrap(),
        vec!["msg 0", "msg 1", "msg 2"]
    );
    assert_eq!(*batches.lock().unwrap(), vec![3]);

    // Exactly capacity records: one automatic flush, no more.
    for i in 0..5 {
        buffered
            .emit(&Record::new("it.buffered", Level::Info, format!("auto {}", i)))
            .unwrap();
    }
    assert_eq!(*batches.lock().unwrap(), vec![3, 5]);
    assert_eq!(messages.lock().unwrap().len(), 8);
}

#[test]
fn async_handler_preserves_order_and_drains_on_close() {
    let (capture, messages, _batches) = Capture::new();
    let mut handler = AsyncHandler::new(Box::new(capture), 16).unwrap();

    for msg in ["r1", "r2", "r3"] {
        handler
            .emit(&Record::new("it.async", Level::Info, msg))
            .unwrap();
    }
    let report = handler.close_with_timeout(std::time::Duration::from_secs(5));

    assert!(!report.timed_out);
    assert_eq!(report.delivered, 3);
    assert_eq!(*messages.lock().unwrap(), vec!["r1", "r2", "r3"]);
}

#[test]
fn rotation_keeps_at_most_backup_count_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rotate.log");
    let mut settings = Settings::default();
    settings.rotation.max_bytes = 64;
    settings.rotation.backup_count = 3;

    let mut handler = RotatingFileHandler::from_settings(&path, &settings).unwrap();
    for i in 0..40 {
        handler
            .emit(&Record::new("it.rotation", Level::Info, format!("record {}", i)))
            .unwrap();
    }
    handler.close().unwrap();

    assert!(path.exists());
    let backups: Vec<PathBuf> = (1..=6)
        .map(|i| dir.path().join(format!("rotate.log.{}", i)))
        .filter(|p| p.exists())
        .collect();
    assert_eq!(backups.len(), 3);
    assert!(!dir.path().join("rotate.log.4").exists());
}

#[test]
fn single_threshold_crossing_rotates_exactly_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("once.log");
    let mut settings = Settings::default();
    settings.rotation.max_bytes = 200;
    settings.rotation.backup_count = 5;

    let mut handler = RotatingFileHandler::from_settings(&path, &settings).unwrap();
    // Two writes, the second crossing the threshold.
    handler
        .emit(&Record::new("it.once", Level::Info, "x".repeat(150)))
        .unwrap();
    handler
        .emit(&Record::new("it.once", Level::Info, "y".repeat(150)))
        .unwrap();
    handler.close().unwrap();

    assert!(dir.path().join("once.log.1").exists());
    assert!(!dir.path().join("once.log.2").exists());
}

#[test]
fn toml_round_trip_reproduces_settings() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        "richlog.toml",
        r#"
[richlog]
level = "WARNING"
format = "SIMPLE"
date_format = "US"
rich_tracebacks = false
traceback_suppress = ["tokio"]
"#,
    );
    let settings =
        Settings::resolve(&Overrides::new(), Some(&config), &Environment::empty()).unwrap();

    let round_trip = write_config(dir.path(), "round.toml", &settings.to_toml_string());
    let reparsed =
        Settings::resolve(&Overrides::new(), Some(&round_trip), &Environment::empty()).unwrap();
    assert_eq!(settings, reparsed);
}

#[test]
fn unknown_preset_fails_before_logger_creation() {
    let err = setup_with_preset("it.unknown_preset", "staging").unwrap_err();
    match err {
        Error::UnknownPreset { ref name, .. } => assert_eq!(name, "staging"),
        other => panic!("expected UnknownPreset, got {}", other),
    }
    assert!(existing_logger("it.unknown_preset").is_none());
}

#[test]
fn factory_is_idempotent_and_reconfigures() {
    let settings = Settings::default();
    let first = get_rich_logger("it.idempotent", &settings);
    assert_eq!(first.handler_count(), 1);

    let mut reconfigured = Settings::default();
    reconfigured.level = Level::Error;
    let second = get_rich_logger("it.idempotent", &reconfigured);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.level(), Level::Error);
    // Reconfiguration replaces the chain instead of stacking another handler.
    assert_eq!(first.handler_count(), 1);
}

#[test]
fn json_over_rotating_file_chain_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chain.jsonl");
    let mut settings = Settings::default();
    settings.rotation.max_bytes = 0;

    let file = RotatingFileHandler::from_settings(&path, &settings).unwrap();
    let mut handler = AsyncHandler::new(Box::new(JsonHandler::new(Box::new(file))), 16).unwrap();

    for i in 0..5 {
        handler
            .emit(&Record::new("it.chain", Level::Info, format!("event {}", i)))
            .unwrap();
    }
    handler.close().unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 5);
    for (i, line) in lines.iter().enumerate() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["message"], format!("event {}", i));
        assert_eq!(value["name"], "it.chain");
    }
}

#[test]
fn json_shortcut_filters_by_level() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("filtered.jsonl");
    let logger = setup_json_logger(
        "it.json_filtered",
        &path,
        &JsonLoggerOptions {
            level: Level::Warning,
            ..Default::default()
        },
    )
    .unwrap();

    logger.debug("dropped");
    logger.info("dropped");
    logger.warning("kept");
    logger.error("kept");
    logger.close().unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("kept"));
    assert!(!contents.contains("dropped"));
}

#[test]
fn macros_record_call_site_location() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("located.jsonl");
    let logger = setup_json_logger("it.located", &path, &JsonLoggerOptions::default()).unwrap();

    richlog::info!(logger, "from the macro");
    logger.close().unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
    assert!(value["filename"]
        .as_str()
        .unwrap()
        .ends_with("integration_tests.rs"));
    assert!(value["lineno"].as_u64().unwrap() > 0);
}
