//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// Where and how the contact API listens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Bind address for the HTTP listener.
    ///
    /// Common values:
    /// - `[::]:8080` (any address, port 8080)
    /// - `127.0.0.1:8080` (localhost only)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_listen_address() -> String {
    "[::]:8080".to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
