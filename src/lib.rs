//! rowstore - a versioned wide-column row store
//!
//! Layers, bottom up:
//! - `model` - row keys, columns, cells, row results
//! - `visibility` - label expressions and reader authorizations
//! - `store` - per-table versioned rows with atomic put, check-and-put, delete
//! - `scan` - range scans with column, time, label, version and row filters
//! - `transport` - the cluster seam and a recording in-memory transport
//! - `client` - the service facade, its config and the value codec
//! - `fixture` - JSON row fixtures for hydration
//! - `observability` - JSON-line logging, metrics, operation scopes
//! - `cli` - the `rowstore` binary

pub mod cli;
pub mod client;
pub mod errors;
pub mod fixture;
pub mod model;
pub mod observability;
pub mod scan;
pub mod store;
pub mod transport;
pub mod visibility;

pub use errors::ErrorKind;
