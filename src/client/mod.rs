//! Client facade
//!
//! The surface a pipeline engine calls:
//! - `ClientService` - lifecycle plus put / check-and-put / delete / scan
//! - `ServiceConfig` - validated service configuration
//! - `ResultHandler` - push-style scan consumer
//! - `codec` - typed value encodings

pub mod codec;
mod config;
mod errors;
mod handler;
mod service;

pub use codec::{EncodingError, EncodingResult};
pub use config::ServiceConfig;
pub use errors::{ClientError, ClientResult};
pub use handler::{CollectingHandler, ResultHandler};
pub use service::{ClientService, DeleteRequest, PutRow};
