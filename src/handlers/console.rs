//! Console handler: the default rendering target

use crate::config::Settings;
use crate::core::{Formatter, Handler, Level, Record, Result};
use colored::Colorize;

/// Terminal handler writing rendered records to stdout, routing `Error` and
/// `Critical` records to stderr.
///
/// When a decorator upstream already rendered the record (the JSON handler),
/// the pre-rendered line is written verbatim.
pub struct ConsoleHandler {
    formatter: Formatter,
    use_colors: bool,
    rich_tracebacks: bool,
    traceback_suppress: Vec<String>,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self {
            formatter: Formatter::default(),
            use_colors: true,
            rich_tracebacks: true,
            traceback_suppress: Vec::new(),
        }
    }

    /// Build the rendering handler for resolved settings: formatter from the
    /// selected log/date formats plus the traceback options.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            formatter: Formatter::new(
                settings.log_format.clone(),
                settings.date_format.clone(),
            ),
            use_colors: true,
            rich_tracebacks: settings.rich_tracebacks,
            traceback_suppress: settings.traceback_suppress.clone(),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
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
        line
    }

    /// Render attached exception info, dropping frames that mention a
    /// suppressed module.
    fn emit_traceback(&self, exc_info: &str) {
        for line in exc_info.lines() {
            if self
                .traceback_suppress
                .iter()
                .any(|module| line.contains(module.as_str()))
            {
                continue;
            }
            if self.use_colors {
                eprintln!("  {}", line.red());
            } else {
                eprintln!("  {}", line);
            }
        }
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for ConsoleHandler {
    fn emit(&mut self, record: &Record) -> Result<()> {
        let line = self.render(record);
        let output = if self.use_colors && record.rendered.is_none() {
            line.color(record.level.color_code()).to_string()
        } else {
            line
        };

        match record.level {
            Level::Error | Level::Critical => eprintln!("{}", output),
            _ => println!("{}", output),
        }

        if self.rich_tracebacks && record.rendered.is_none() {
            if let Some(exc_info) = &record.exc_info {
                self.emit_traceback(exc_info);
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
