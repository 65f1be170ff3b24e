//! OperationScope for begin/complete logging around one client operation
//!
//! - Logs `{name}_BEGIN` on creation (TRACE)
//! - Logs `{name}_COMPLETE` on `complete()` (TRACE)
//! - Logs `{name}_FAILED` on `fail()` (ERROR)
//! - Logs `{name}_INCOMPLETE` on drop if neither was called (WARN)

use std::time::Instant;

use super::logger::{Logger, Severity};

/// # Usage
///
/// ```ignore
/// let scope = OperationScope::new("PUT", &[("table", "users")]);
/// // ... do work ...
/// scope.complete(&[("cells", "2")]);
/// ```
pub struct OperationScope {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    started: Instant,
    finished: bool,
}

impl OperationScope {
    pub fn new(name: &'static str, fields: &[(&'static str, &str)]) -> Self {
        let scope = Self {
            name,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
            finished: false,
        };
        scope.emit(Severity::Trace, "BEGIN", &[]);
        scope
    }

    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms();
        let mut fields: Vec<(&str, &str)> = extra.to_vec();
        fields.push(("elapsed_ms", elapsed.as_str()));
        self.emit(Severity::Trace, "COMPLETE", &fields);
    }

    /// Logs the failure with its error code and message.
    pub fn fail(mut self, code: &str, reason: &str) {
        self.finished = true;
        self.emit(Severity::Error, "FAILED", &[("code", code), ("reason", reason)]);
    }

    pub fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }

    fn emit(&self, severity: Severity, suffix: &str, extra: &[(&str, &str)]) {
        if !Logger::enabled(severity) {
            return;
        }
        let event = format!("{}_{}", self.name, suffix);
        let mut fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        fields.extend_from_slice(extra);
        Logger::log(severity, &event, &fields);
    }
}

impl Drop for OperationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(
                Severity::Warn,
                "INCOMPLETE",
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}
