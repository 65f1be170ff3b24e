//! Client service configuration
//!
//! Loaded from a JSON file or built in code. Every config passes
//! `validate()` before a service is enabled with it.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::TableName;
use crate::transport::ConnectionSettings;

use super::errors::{ClientError, ClientResult};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Connection timeout in milliseconds (default 10000)
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Opaque reference to credentials held elsewhere; never logged
    #[serde(default)]
    pub credentials_ref: Option<String>,

    /// Cluster endpoints (required, non-empty)
    pub cluster_endpoints: Vec<String>,

    /// Tables created and hydrated when the service is enabled
    #[serde(default)]
    pub tables: Vec<String>,

    /// Default per-column version cap for scans; unlimited when absent
    #[serde(default)]
    pub max_versions: Option<usize>,

    /// Default scan deadline in milliseconds
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

fn default_connection_timeout_ms() -> u64 {
    10_000
}

impl ServiceConfig {
    pub fn new(endpoints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            connection_timeout_ms: default_connection_timeout_ms(),
            credentials_ref: None,
            cluster_endpoints: endpoints.into_iter().map(Into::into).collect(),
            tables: Vec::new(),
            max_versions: None,
            operation_timeout_ms: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ClientResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ClientError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ServiceConfig = serde_json::from_str(&content)
            .map_err(|e| ClientError::config(format!("invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.connection_timeout_ms == 0 {
            return Err(ClientError::config("connection_timeout_ms must be > 0"));
        }

        if self.cluster_endpoints.is_empty() {
            return Err(ClientError::config("cluster_endpoints must not be empty"));
        }
        if self.cluster_endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(ClientError::config("cluster_endpoints must not contain blank entries"));
        }

        if self.max_versions == Some(0) {
            return Err(ClientError::config("max_versions must be >= 1"));
        }
        if self.operation_timeout_ms == Some(0) {
            return Err(ClientError::config("operation_timeout_ms must be > 0"));
        }

        for table in &self.tables {
            TableName::new(table.as_str())?;
        }
        Ok(())
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            endpoints: self.cluster_endpoints.clone(),
            connection_timeout: Duration::from_millis(self.connection_timeout_ms),
            credentials_ref: self.credentials_ref.clone(),
        }
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("connection_timeout_ms", &self.connection_timeout_ms)
            .field(
                "credentials_ref",
                &self.credentials_ref.as_ref().map(|_| "<redacted>"),
            )
            .field("cluster_endpoints", &self.cluster_endpoints)
            .field("tables", &self.tables)
            .field("max_versions", &self.max_versions)
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .finish()
    }
}
