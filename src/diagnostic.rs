use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Receives non-fatal findings while a dump is parsed. Reporting never
/// changes what the parser returns.
pub trait DiagnosticSink {
    fn report(&mut self, severity: Severity, message: &str);
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => log::debug!("{message}"),
            Severity::Info => log::info!("{message}"),
            Severity::Warn => log::warn!("{message}"),
            Severity::Error => log::error!("{message}"),
        }
    }
}

/// Keeps every report in memory, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub entries: Vec<(Severity, String)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(&self, severity: Severity) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, severity: Severity, message: &str) {
        self.entries.push((severity, message.to_string()));
    }
}

/// A line whose prefix claimed a role (lock annotation, state line, header
/// field) but whose detailed extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine<'a> {
    /// 1-based
    pub line_no: usize,
    pub reason: &'static str,
    pub line: &'a str,
}

impl fmt::Display for MalformedLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}. {}", self.line_no, self.reason, self.line)
    }
}
