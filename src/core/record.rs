//! Log record structure

use super::fields::Fields;
use super::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One structured log event.
///
/// A record carries everything a handler chain needs: the owning logger's
/// name, severity, message, UTC timestamp, optional call-site location,
/// optional exception text, and optional structured fields.
///
/// `rendered` is set by decorator handlers (the JSON handler) that take over
/// presentation; terminal handlers write it verbatim when present instead of
/// running their own formatter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub level: Level,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub file: Option<String>,
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exc_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,
    #[serde(skip)]
    pub rendered: Option<String>,
}

impl Record {
    /// Sanitize the message to prevent log injection.
    ///
    /// Newlines, carriage returns, and tabs are replaced with escape
    /// sequences so one emitted message stays one line of output.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(name: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            message: Self::sanitize_message(&message.into()),
            timestamp: Utc::now(),
            file: None,
            line: None,
            exc_info: None,
            fields: None,
            rendered: None,
        }
    }

    pub fn with_location(mut self, file: &str, line: u32) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_exc_info(mut self, exc_info: impl Into<String>) -> Self {
        self.exc_info = Some(exc_info.into());
        self
    }

    /// Basename of the source file, as rendered by `%(filename)s`
    pub fn filename(&self) -> &str {
        self.file
            .as_deref()
            .map(|f| {
                std::path::Path::new(f)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(f)
            })
            .unwrap_or("")
    }
}
