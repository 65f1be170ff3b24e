//! Lifecycle events
//!
//! Every event has a fixed log name and a fixed severity.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Service lifecycle
    ServiceEnableBegin,
    ServiceEnabled,
    ServiceEnableFailed,
    ServiceDisabled,

    // Configuration
    ConfigLoaded,
    ConfigRejected,

    // Tables
    TableHydrated,
    FixtureLoaded,

    // Scans
    ScanCancelled,
    ScanTimedOut,

    // Transport
    TransportFailure,

    // CLI server
    Serving,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ServiceEnableBegin => "SERVICE_ENABLE_BEGIN",
            Event::ServiceEnabled => "SERVICE_ENABLED",
            Event::ServiceEnableFailed => "SERVICE_ENABLE_FAILED",
            Event::ServiceDisabled => "SERVICE_DISABLED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigRejected => "CONFIG_REJECTED",
            Event::TableHydrated => "TABLE_HYDRATED",
            Event::FixtureLoaded => "FIXTURE_LOADED",
            Event::ScanCancelled => "SCAN_CANCELLED",
            Event::ScanTimedOut => "SCAN_TIMED_OUT",
            Event::TransportFailure => "TRANSPORT_FAILURE",
            Event::Serving => "ROWSTORE_SERVING",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::ServiceEnableFailed | Event::ConfigRejected | Event::TransportFailure => {
                Severity::Error
            }
            Event::ScanCancelled | Event::ScanTimedOut => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
