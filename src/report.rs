//! Stage execution logs.
//!
//! Every line a stage emits to the terminal is also kept, so the stage can
//! leave a readable `logs/<stage>.log` next to its structured output.

use std::path::Path;

use crate::error::Result;
use crate::provenance::write_report_text;
use crate::ui::prelude::{Level, emit};

#[derive(Debug, Clone)]
pub struct ReportLine {
    pub level: Level,
    pub code: &'static str,
    pub message: String,
}

impl ReportLine {
    pub fn new(level: Level, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct StageLog {
    stage: &'static str,
    lines: Vec<ReportLine>,
}

impl StageLog {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            lines: Vec::new(),
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn push(&mut self, level: Level, code: &'static str, message: impl Into<String>) {
        let line = ReportLine::new(level, code, message);
        emit(line.level, line.code, &line.message, None);
        self.lines.push(line);
    }

    /// Keep a line for the log file without printing it.
    pub fn record(&mut self, level: Level, code: &'static str, message: impl Into<String>) {
        self.lines.push(ReportLine::new(level, code, message));
    }

    pub fn info(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Level::Info, code, message);
    }

    pub fn success(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Level::Success, code, message);
    }

    pub fn warn(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Level::Warn, code, message);
    }

    pub fn error(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Level::Error, code, message);
    }

    pub fn debug(&mut self, code: &'static str, message: impl Into<String>) {
        self.push(Level::Debug, code, message);
    }

    pub fn count(&self, level: Level) -> usize {
        self.lines.iter().filter(|line| line.level == level).count()
    }

    /// Write the collected lines to `path`, replacing any previous log.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut text = self.format_lines().join("\n");
        text.push('\n');
        write_report_text(path, &text)
    }

    pub fn format_lines(&self) -> Vec<String> {
        self.lines.iter().flat_map(format_report_line).collect()
    }
}

fn format_report_line(line: &ReportLine) -> Vec<String> {
    let prefix = format!("[{}] ", level_label(line.level));
    let mut message_lines = line.message.lines();
    let Some(first) = message_lines.next() else {
        return vec![prefix.trim_end().to_string()];
    };

    let mut formatted = Vec::new();
    formatted.push(format!("{prefix}{first}"));

    let indent = " ".repeat(prefix.len());
    for rest in message_lines {
        formatted.push(format!("{indent}{rest}"));
    }

    formatted
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Info => "INFO",
        Level::Success => "OK",
        Level::Warn => "WARN",
        Level::Error => "ERROR",
        Level::Debug => "DEBUG",
    }
}
