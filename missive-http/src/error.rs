//! HTTP server error types.

use thiserror::Error;

/// Errors from binding or serving the contact API.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Failed to bind the listener to the configured address.
    #[error("failed to bind contact API to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// The server loop terminated with an error.
    #[error("contact API server error: {0}")]
    Server(String),
}
