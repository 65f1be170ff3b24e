//! Observability for the client service
//!
//! This module provides:
//! - Structured logging (JSON lines)
//! - Lock-free metrics
//! - Lifecycle event and per-operation scope tracing
//!
//! Observability is read-only: it never changes the outcome of the
//! operation being observed, and a failed log write is ignored.
//!
//! # Usage
//!
//! ```ignore
//! use rowstore::observability::{Logger, Event, MetricsRegistry, OperationScope};
//!
//! Logger::info("TABLE_HYDRATED", &[("rows", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_put(2);
//!
//! let scope = OperationScope::new("PUT", &[("table", "users")]);
//! scope.complete(&[]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::OperationScope;

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_event(event: Event, fields: &[(&str, &str)]) -> serde_json::Value {
        let line = logger::capture_log(event.severity(), event.as_str(), fields);
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_event_lines_use_event_severity() {
        let failure = render_event(Event::TransportFailure, &[("op", "put")]);
        assert_eq!(failure["event"], "TRANSPORT_FAILURE");
        assert_eq!(failure["severity"], "ERROR");
        assert_eq!(failure["op"], "put");

        let enabled = render_event(Event::ServiceEnabled, &[("tables", "2")]);
        assert_eq!(enabled["event"], "SERVICE_ENABLED");
        assert_eq!(enabled["severity"], "INFO");
        assert_eq!(enabled["tables"], "2");
    }
}
