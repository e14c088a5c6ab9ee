/// Declarative JSON codec for entity types.
pub mod codec;
/// Client settings and config file loading.
pub mod config;
/// HTTP requests, the worker pool and delegate notifications.
pub mod http;

pub use codec::{decode, encode, CodecError, Entity, FieldTable};
pub use config::ClientConfig;
pub use http::{ApiError, ApiRequest, ApiResponse, ApiService, Delegate};

/// Logging verbosity for request execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Also log request URLs and bodies.
    Debug,
    /// Log request timings and failures only.
    Information,
}

impl Default for LogLevel {
    /// Defaults to `Information` logging.
    fn default() -> Self {
        LogLevel::Information
    }
}
