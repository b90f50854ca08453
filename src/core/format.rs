//! Log and date format tables and the template renderer
//!
//! Formats are tagged variants: either a named member of the fixed table or
//! an arbitrary user-supplied template, both resolving to the same literal
//! template string before use. Custom log templates must reference only
//! known placeholders; custom date formats must be valid strftime.

use super::error::{Error, Result};
use super::record::Record;
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use serde::{Deserialize, Serialize};

/// Placeholders a log template may reference
const KNOWN_PLACEHOLDERS: &[&str] = &[
    "message",
    "levelname",
    "name",
    "asctime",
    "filename",
    "lineno",
];

/// Log message format: a named template or a custom `%(field)s` template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    /// `%(message)s`
    #[default]
    Default,
    /// `%(levelname)s: %(message)s`
    Simple,
    /// `%(asctime)s - %(name)s - %(levelname)s - %(message)s`
    Verbose,
    /// `%(asctime)s - %(name)s - %(levelname)s - [%(filename)s:%(lineno)d] - %(message)s`
    Detailed,
    /// Empty template
    Nothing,
    /// User-supplied template, validated at construction
    Custom(String),
}

impl LogFormat {
    /// The literal template string this format resolves to
    pub fn template(&self) -> &str {
        match self {
            LogFormat::Default => "%(message)s",
            LogFormat::Simple => "%(levelname)s: %(message)s",
            LogFormat::Verbose => "%(asctime)s - %(name)s - %(levelname)s - %(message)s",
            LogFormat::Detailed => {
                "%(asctime)s - %(name)s - %(levelname)s - [%(filename)s:%(lineno)d] - %(message)s"
            }
            LogFormat::Nothing => "",
            LogFormat::Custom(template) => template,
        }
    }

    /// The value written back to a config file: the variant name for named
    /// members, the raw template for custom ones
    pub fn config_value(&self) -> &str {
        match self {
            LogFormat::Default => "DEFAULT",
            LogFormat::Simple => "SIMPLE",
            LogFormat::Verbose => "VERBOSE",
            LogFormat::Detailed => "DETAILED",
            LogFormat::Nothing => "NOTHING",
            LogFormat::Custom(template) => template,
        }
    }

    /// Parse a config value: a named member (case-insensitive) or a custom
    /// template, which must validate
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_uppercase().as_str() {
            "DEFAULT" => Ok(LogFormat::Default),
            "SIMPLE" => Ok(LogFormat::Simple),
            "VERBOSE" => Ok(LogFormat::Verbose),
            "DETAILED" => Ok(LogFormat::Detailed),
            "NOTHING" => Ok(LogFormat::Nothing),
            _ => {
                validate_template(value)?;
                Ok(LogFormat::Custom(value.to_string()))
            }
        }
    }
}

/// Date format: a named strftime template or a custom one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    /// `%Y-%m-%d %H:%M:%S`
    #[default]
    Default,
    /// `%Y-%m-%dT%H:%M:%S`
    Iso8601,
    /// `%m/%d/%Y %I:%M:%S %p`
    Us,
    /// `%d/%m/%Y %H:%M:%S`
    Eu,
    /// Empty template
    Nothing,
    /// User-supplied strftime format, validated at construction
    Custom(String),
}

impl DateFormat {
    /// The literal strftime string this format resolves to
    pub fn template(&self) -> &str {
        match self {
            DateFormat::Default => "%Y-%m-%d %H:%M:%S",
            DateFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S",
            DateFormat::Us => "%m/%d/%Y %I:%M:%S %p",
            DateFormat::Eu => "%d/%m/%Y %H:%M:%S",
            DateFormat::Nothing => "",
            DateFormat::Custom(template) => template,
        }
    }

    /// The value written back to a config file
    pub fn config_value(&self) -> &str {
        match self {
            DateFormat::Default => "DEFAULT",
            DateFormat::Iso8601 => "ISO8601",
            DateFormat::Us => "US",
            DateFormat::Eu => "EU",
            DateFormat::Nothing => "NOTHING",
            DateFormat::Custom(template) => template,
        }
    }

    /// Parse a config value: a named member (case-insensitive) or a custom
    /// strftime string, which must validate
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_uppercase().as_str() {
            "DEFAULT" => Ok(DateFormat::Default),
            "ISO8601" => Ok(DateFormat::Iso8601),
            "US" => Ok(DateFormat::Us),
            "EU" => Ok(DateFormat::Eu),
            "NOTHING" => Ok(DateFormat::Nothing),
            _ => {
                if StrftimeItems::new(value).any(|item| matches!(item, Item::Error)) {
                    return Err(Error::config(
                        "date_format",
                        format!("'{}' is not a valid strftime format string", value),
                    ));
                }
                Ok(DateFormat::Custom(value.to_string()))
            }
        }
    }
}

/// Validate that a custom log template only references known placeholders
fn validate_template(template: &str) -> Result<()> {
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            // Literal percent
            Some('%') => {}
            Some('(') => {
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == ')' {
                        break;
                    }
                    name.push(c);
                }
                // Conversion character follows the closing paren
                match chars.next() {
                    Some('s') | Some('d') => {}
                    _ => {
                        return Err(Error::config(
                            "format",
                            format!(
                                "placeholder '%({})' must end with a 's' or 'd' conversion",
                                name
                            ),
                        ))
                    }
                }
                if !KNOWN_PLACEHOLDERS.contains(&name.as_str()) {
                    return Err(Error::config(
                        "format",
                        format!(
                            "unknown placeholder '%({})s', expected one of: {}",
                            name,
                            KNOWN_PLACEHOLDERS.join(", ")
                        ),
                    ));
                }
            }
            _ => {
                return Err(Error::config(
                    "format",
                    "templates use '%(name)s' placeholders; a bare '%' must be written '%%'",
                ))
            }
        }
    }
    Ok(())
}

/// Renders records through a resolved log/date format pair.
///
/// Substitution is string based, matching the `%(field)s` templates of the
/// format table above. Timestamps render in local time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatter {
    log_format: LogFormat,
    date_format: DateFormat,
}

impl Formatter {
    pub fn new(log_format: LogFormat, date_format: DateFormat) -> Self {
        Self {
            log_format,
            date_format,
        }
    }

    pub fn log_format(&self) -> &LogFormat {
        &self.log_format
    }

    pub fn date_format(&self) -> &DateFormat {
        &self.date_format
    }

    fn asctime(&self, record: &Record) -> String {
        let template = self.date_format.template();
        if template.is_empty() {
            return String::new();
        }
        record
            .timestamp
            .with_timezone(&Local)
            .format(template)
            .to_string()
    }

    /// Render a record to one line of text
    pub fn render(&self, record: &Record) -> String {
        let template = self.log_format.template();
        let mut output = String::with_capacity(template.len() + record.message.len());

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                output.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => output.push('%'),
                Some('(') => {
                    let mut name = String::new();
                    for c in chars.by_ref() {
                        if c == ')' {
                            break;
                        }
                        name.push(c);
                    }
                    // Skip the conversion character, validated at parse time
                    chars.next();
                    match name.as_str() {
                        "message" => output.push_str(&record.message),
                        "levelname" => output.push_str(record.level.to_str()),
                        "name" => output.push_str(&record.name),
                        "asctime" => output.push_str(&self.asctime(record)),
                        "filename" => output.push_str(record.filename()),
                        "lineno" => {
                            output.push_str(&record.line.map(|l| l.to_string()).unwrap_or_default())
                        }
                        // Unknown names are rejected at parse time
                        _ => {}
                    }
                }
                Some(other) => {
                    output.push('%');
                    output.push(other);
                }
                None => output.push('%'),
            }
        }

        output
    }
}
