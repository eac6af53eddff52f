//! Typed errors for dispatch operations.
//!
//! A [`DeliveryError`] describes one failed SMTP transaction. The
//! [`FailureKind`] classification exists for log lines and diagnostics
//! only; control flow never branches on it.

use std::fmt;

use missive_smtp::ClientError;
use thiserror::Error;

/// Failure of a single SMTP transaction.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The relay actively refused the TCP connection.
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// Any other connection-level failure, including unexpected EOF.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// TLS negotiation failed.
    #[error("TLS failure: {0}")]
    Tls(String),

    /// The relay rejected our credentials.
    #[error("Authentication failed ({code}): {message}")]
    Authentication { code: u16, message: String },

    /// The relay rejected a protocol stage with an unexpected code.
    #[error("Server rejected {stage}: {code} {message}")]
    Rejected {
        stage: &'static str,
        code: u16,
        message: String,
    },

    /// The reply stream could not be understood.
    #[error("Protocol failure: {0}")]
    Protocol(String),

    /// A protocol stage exceeded its configured timeout.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
}

impl DeliveryError {
    /// Classifies this failure for logs and diagnostics.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConnectionRefused(_) => FailureKind::ConnectionRefused,
            // 530/534/535 are the authentication-required/failed family.
            Self::Authentication { .. } | Self::Rejected { code: 530 | 534 | 535, .. } => {
                FailureKind::Authentication
            }
            Self::Tls(message) if message.to_lowercase().contains("certificate") => {
                FailureKind::Certificate
            }
            _ => FailureKind::Other,
        }
    }
}

impl From<ClientError> for DeliveryError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
                Self::ConnectionRefused(io.to_string())
            }
            ClientError::Io(io) => Self::Connection(io.to_string()),
            ClientError::Tls(message) => Self::Tls(message),
            ClientError::ConnectionClosed => {
                Self::Connection("connection closed unexpectedly".to_owned())
            }
            ClientError::Parse(message) => Self::Protocol(message),
            ClientError::Utf8(utf8) => Self::Protocol(utf8.to_string()),
        }
    }
}

/// Log-only classification of delivery failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConnectionRefused,
    Authentication,
    Certificate,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConnectionRefused => "connection-refused",
            Self::Authentication => "authentication-failure",
            Self::Certificate => "certificate-error",
            Self::Other => "other",
        })
    }
}

/// Aggregate outcome of one dispatch, which attempts both messages even
/// when the first fails.
#[derive(Debug, Error)]
#[error("{} of {attempted} messages failed to send", .failures.len())]
pub struct DispatchError {
    /// How many sends were attempted.
    pub attempted: usize,
    /// The error of each failed send.
    pub failures: Vec<DeliveryError>,
}
