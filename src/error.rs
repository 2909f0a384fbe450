//! Error types
//!
//! Module-level errors ([`RegistryError`], [`CodecError`]) convert into the
//! crate-wide [`Error`] with `?`.

use crate::codec::CodecError;
use crate::registry::RegistryError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (socket bind, accept)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry rejected an operation
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Transport encryption failure
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// JSON payload could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex payload could not be decoded
    #[error("Hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// HTTP client failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an unexpected status
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// Status code returned
        status: u16,
        /// Request URL
        url: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}
