//! TLS settings for outbound SMTP connections.

use serde::{Deserialize, Serialize};

/// How TLS is established when talking to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// Pick based on the relay port: implicit TLS on 465, STARTTLS otherwise.
    #[default]
    Auto,

    /// TLS handshake immediately after the TCP connect (SMTPS).
    Implicit,

    /// Plain connect, then upgrade via STARTTLS when the server advertises it.
    Starttls,

    /// Never negotiate TLS.
    ///
    /// Only sensible for relays on a trusted network or in tests.
    Disabled,
}

impl TlsMode {
    /// Resolves `Auto` against the relay port. Never returns `Auto`.
    #[must_use]
    pub const fn resolve(self, port: u16) -> Self {
        match self {
            Self::Auto => {
                if port == 465 {
                    Self::Implicit
                } else {
                    Self::Starttls
                }
            }
            mode => mode,
        }
    }
}

/// TLS configuration for the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TlsOptions {
    /// TLS negotiation mode.
    #[serde(default)]
    pub mode: TlsMode,

    /// Whether to accept invalid TLS certificates (self-signed, expired, or
    /// otherwise unverifiable).
    ///
    /// Some providers terminate SMTP behind a local bridge with a
    /// self-signed certificate; this flag exists for exactly that setup.
    /// Leaving certificate validation enabled is strongly preferred.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl TlsOptions {
    /// Port-derived negotiation with certificate validation on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: TlsMode::Auto,
            accept_invalid_certs: false,
        }
    }

    /// Disables TLS entirely.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            mode: TlsMode::Disabled,
            accept_invalid_certs: false,
        }
    }

    /// Port-derived negotiation that accepts any certificate.
    ///
    /// For provider bridges with self-signed chains, and for tests.
    #[must_use]
    pub const fn insecure() -> Self {
        Self {
            mode: TlsMode::Auto,
            accept_invalid_certs: true,
        }
    }
}
