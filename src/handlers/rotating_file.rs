//! Size-based rotating file handler

use crate::config::{RotationConfig, Settings};
use crate::core::{Error, Formatter, Handler, Record, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File handler that rotates when writing a record would push the active file
/// past `max_bytes`.
///
/// Rotation shifts backups upward (`app.log.1` -> `app.log.2`, ...), discards
/// the oldest once `backup_count` is reached, and renames the active file to
/// `app.log.1`. With `backup_count == 0` the active file is truncated in
/// place. A `max_bytes` of zero disables rotation entirely.
///
/// Rotation failures surface as errors from `emit`; they are not swallowed.
pub struct RotatingFileHandler {
    base_path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    formatter: Formatter,
}

impl RotatingFileHandler {
    pub fn new<P: AsRef<Path>>(path: P, rotation: RotationConfig) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::file_handler(
                        base_path.display().to_string(),
                        format!("failed to create parent directory: {}", e),
                    )
                })?;
            }
        }

        let file = Self::open_append(&base_path)?;
        let current_size = file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| {
                Error::file_handler(
                    base_path.display().to_string(),
                    format!("failed to read file metadata: {}", e),
                )
            })?;

        Ok(Self {
            base_path,
            max_bytes: rotation.max_bytes,
            backup_count: rotation.backup_count,
            writer: Some(BufWriter::new(file)),
            current_size,
            formatter: Formatter::default(),
        })
    }

    /// Build a rotating handler from resolved settings: rotation limits plus
    /// the configured log/date formats.
    pub fn from_settings<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<Self> {
        Ok(Self::new(path, settings.rotation.clone())?.with_formatter(Formatter::new(
            settings.log_format.clone(),
            settings.date_format.clone(),
        )))
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn open_append(path: &Path) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                Error::file_handler(
                    path.display().to_string(),
                    format!("failed to open log file: {}", e),
                )
            })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.base_path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// Rotation triggers only when the file already holds data, so a single
    /// oversized record still lands in a fresh file instead of rotating on
    /// every write.
    fn would_exceed(&self, incoming: u64) -> bool {
        self.max_bytes > 0
            && self.current_size > 0
            && self.current_size + incoming > self.max_bytes
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                Error::file_rotation(
                    self.base_path.display().to_string(),
                    format!("failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.backup_count == 0 {
            // No backups kept: truncate the active file in place.
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.base_path)
                .map_err(|e| {
                    Error::file_rotation(
                        self.base_path.display().to_string(),
                        format!("failed to truncate log file: {}", e),
                    )
                })?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(|e| {
                Error::file_rotation(
                    oldest.display().to_string(),
                    format!("failed to remove oldest backup: {}", e),
                )
            })?;
        }

        for index in (1..self.backup_count).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                let to = self.backup_path(index + 1);
                fs::rename(&from, &to).map_err(|e| {
                    Error::file_rotation(
                        from.display().to_string(),
                        format!("failed to shift backup: {}", e),
                    )
                })?;
            }
        }

        fs::rename(&self.base_path, self.backup_path(1)).map_err(|e| {
            Error::file_rotation(
                self.base_path.display().to_string(),
                format!("failed to archive active file: {}", e),
            )
        })?;

        self.writer = Some(BufWriter::new(Self::open_append(&self.base_path)?));
        self.current_size = 0;
        Ok(())
    }

    fn render(&self, record: &Record) -> String {
        if let Some(rendered) = &record.rendered {
            return rendered.clone();
        }
        let mut line = self.formatter.render(record);
        if let Some(fields) = &record.fields {
            if !fields.is_empty() {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&fields.format_fields());
            }
        }
        if let Some(exc_info) = &record.exc_info {
            for exc_line in exc_info.lines() {
                line.push_str("\n  ");
                line.push_str(exc_line);
            }
        }
        line
    }
}

impl Handler for RotatingFileHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let mut line = self.render(record);
        line.push('\n');
        let incoming = line.len() as u64;

        if self.would_exceed(incoming) {
            self.rotate()?;
        }

        let writer = self.writer.as_mut().ok_or_else(|| {
            Error::HandlerClosed("rotating_file".to_string())
        })?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            Error::io_operation("write", format!("failed to write log record: {}", e), e)
        })?;
        self.current_size += incoming;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| {
                Error::io_operation("flush", format!("failed to flush log file: {}", e), e)
            })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.writer = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileHandler {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DateFormat, Level, LogFormat};
    use tempfile::TempDir;

    fn plain_handler(path: &Path, max_bytes: u64, backup_count: usize) -> RotatingFileHandler {
        RotatingFileHandler::new(
            path,
            RotationConfig {
                max_bytes,
                backup_count,
            },
        )
        .unwrap()
        .with_formatter(Formatter::new(LogFormat::Default, DateFormat::Nothing))
    }

    #[test]
    fn test_writes_records_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut handler = plain_handler(&path, 0, 0);

        handler.emit(&Record::new("app", Level::Info, "first")).unwrap();
        handler.emit(&Record::new("app", Level::Info, "second")).unwrap();
        handler.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_rotates_when_write_would_exceed_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut handler = plain_handler(&path, 30, 3);

        // Each record renders to 20 bytes with the newline.
        for i in 0..2 {
            handler
                .emit(&Record::new("app", Level::Info, format!("record number {:05}", i)))
                .unwrap();
        }
        handler.close().unwrap();

        assert!(path.exists());
        assert!(dir.path().join("app.log.1").exists());
        let active = fs::read_to_string(&path).unwrap();
        assert_eq!(active, "record number 00001\n");
        let backup = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert_eq!(backup, "record number 00000\n");
    }

    #[test]
    fn test_discards_oldest_backup_beyond_backup_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut handler = plain_handler(&path, 10, 2);

        for i in 0..5 {
            handler
                .emit(&Record::new("app", Level::Info, format!("msg {}", i)))
                .unwrap();
        }
        handler.close().unwrap();

        assert!(dir.path().join("app.log.1").exists());
        assert!(dir.path().join("app.log.2").exists());
        assert!(!dir.path().join("app.log.3").exists());

        // Newest backup first: .1 holds the record before the active file.
        let newest = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert_eq!(newest, "msg 3\n");
    }

    #[test]
    fn test_zero_backup_count_truncates_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut handler = plain_handler(&path, 10, 0);

        for i in 0..4 {
            handler
                .emit(&Record::new("app", Level::Info, format!("msg {}", i)))
                .unwrap();
        }
        handler.close().unwrap();

        assert!(!dir.path().join("app.log.1").exists());
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "msg 3\n");
    }

    #[test]
    fn test_zero_max_bytes_never_rotates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut handler = plain_handler(&path, 0, 3);

        for i in 0..50 {
            handler
                .emit(&Record::new("app", Level::Info, format!("msg {}", i)))
                .unwrap();
        }
        handler.close().unwrap();

        assert!(!dir.path().join("app.log.1").exists());
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 50);
    }

    #[test]
    fn test_oversized_record_still_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut handler = plain_handler(&path, 8, 2);

        handler
            .emit(&Record::new("app", Level::Info, "a record far beyond the limit"))
            .unwrap();
        handler.close().unwrap();

        // No prior data, so the write goes into the active file unrotated.
        assert!(!dir.path().join("app.log.1").exists());
        assert!(fs::read_to_string(&path).unwrap().contains("far beyond"));
    }

    #[test]
    fn test_emit_after_close_errors() {
        let dir = TempDir::new().unwrap();
        let mut handler = plain_handler(&dir.path().join("app.log"), 0, 0);
        handler.close().unwrap();
        let err = handler
            .emit(&Record::new("app", Level::Info, "late"))
            .unwrap_err();
        assert!(matches!(err, Error::HandlerClosed(_)));
    }

    #[test]
    fn test_reopens_existing_file_with_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "previous run\n").unwrap();

        let handler = plain_handler(&path, 0, 0);
        assert_eq!(handler.current_size(), 13);
    }
}
