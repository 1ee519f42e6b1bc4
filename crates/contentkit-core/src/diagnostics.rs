//! Human-readable progress and retry lines.
//!
//! The executor and the bulk orchestrator report what they are doing through
//! a [`DiagnosticsSink`]. The render layer picks the sink: [`NullSink`] when
//! machine-readable output is active, [`StderrSink`] otherwise.

use std::sync::{Arc, Mutex};

/// Receiver for diagnostic lines.
pub trait DiagnosticsSink: Send + Sync {
    /// Report one line.
    fn emit(&self, line: &str);
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _line: &str) {}
}

/// Writes every line to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticsSink for StderrSink {
    fn emit(&self, line: &str) {
        eprintln!("{}", line);
    }
}

/// Forwards every line to `tracing` at info level.
#[cfg(feature = "tracing")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl DiagnosticsSink for TracingSink {
    fn emit(&self, line: &str) {
        tracing::info!(target: "contentkit::diagnostics", "{}", line);
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}

/// Pick the sink for an output mode.
pub fn sink_for_output(machine_readable: bool) -> Arc<dyn DiagnosticsSink> {
    if machine_readable {
        Arc::new(NullSink)
    } else {
        Arc::new(StderrSink)
    }
}

/// Strip the query string from a URL before it is logged.
///
/// Query strings carry filters and draft keys; they never appear in logs.
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) if !query.is_empty() => format!("{}?[redacted]", base),
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit("first");
        sink.emit("second");

        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_recording_sink_clones_share_lines() {
        let sink = RecordingSink::new();
        let handle: Arc<dyn DiagnosticsSink> = Arc::new(sink.clone());
        handle.emit("shared");

        assert_eq!(sink.lines(), vec!["shared"]);
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://svc.example.com/api/v1/blogs?draftKey=secret&limit=10"),
            "https://svc.example.com/api/v1/blogs?[redacted]"
        );
        assert_eq!(
            redact_url("https://svc.example.com/api/v1/blogs"),
            "https://svc.example.com/api/v1/blogs"
        );
        assert_eq!(redact_url("https://a/b?"), "https://a/b");
    }
}
