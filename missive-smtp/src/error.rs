//! Error types for the SMTP client.

use std::io;

use thiserror::Error;

/// Errors that can occur while driving an SMTP session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// IO error during network operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The server sent something that does not parse as an SMTP reply.
    #[error("Failed to parse SMTP reply: {0}")]
    Parse(String),

    /// TLS setup or handshake failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server closed the connection mid-session.
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Reply bytes were not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Specialized `Result` type for SMTP client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
