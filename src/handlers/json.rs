//! JSON decorator: renders records as JSON lines before delivery

use crate::core::{Handler, Record, Result};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

/// Decorator that serializes each record to a single JSON object and forwards
/// the pre-rendered line to the wrapped handler.
///
/// The wrapped handler writes the line verbatim, so any terminal handler can
/// serve as a JSON sink.
pub struct JsonHandler {
    inner: Box<dyn Handler>,
}

impl JsonHandler {
    pub fn new(inner: Box<dyn Handler>) -> Self {
        Self { inner }
    }

    fn render_json(record: &Record) -> Result<String> {
        let mut object = Map::new();
        object.insert(
            "timestamp".to_string(),
            Value::String(
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );
        object.insert("name".to_string(), Value::String(record.name.clone()));
        object.insert(
            "level".to_string(),
            Value::String(record.level.to_str().to_string()),
        );
        object.insert("message".to_string(), Value::String(record.message.clone()));

        if let Some(file) = &record.file {
            object.insert("filename".to_string(), Value::String(file.clone()));
        }
        if let Some(line) = record.line {
            object.insert("lineno".to_string(), Value::Number(line.into()));
        }
        if let Some(exc_info) = &record.exc_info {
            object.insert("exc_info".to_string(), Value::String(exc_info.clone()));
        }
        if let Some(fields) = &record.fields {
            for (key, value) in fields.iter() {
                object.insert(key.clone(), value.to_json_value());
            }
        }

        Ok(serde_json::to_string(&Value::Object(object))?)
    }
}

impl Handler for JsonHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let mut rendered = record.clone();
        rendered.rendered = Some(Self::render_json(record)?);
        self.inner.emit(&rendered)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn name(&self) -> &str {
        "json"
    }
}
