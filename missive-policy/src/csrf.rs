//! CSRF token issuance and validation.
//!
//! Tokens are opaque 64-character hex strings handed to the form page and
//! required back on submission. The store is purely in-memory; restarting
//! the service invalidates all outstanding tokens.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Configuration for CSRF token lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// How long an issued token stays valid, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Whether a successful validation consumes the token.
    ///
    /// Off by default: the form page fetches one token and may retry a
    /// failed submission with it inside the lifetime.
    #[serde(default)]
    pub single_use: bool,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            single_use: false,
        }
    }
}

const fn default_ttl_secs() -> u64 {
    3600 // One hour
}

/// Issues and validates per-session CSRF tokens.
#[derive(Debug)]
pub struct CsrfTokenStore {
    config: CsrfConfig,
    /// Token -> expiry instant.
    tokens: DashMap<String, Instant>,
}

impl CsrfTokenStore {
    #[must_use]
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config,
            tokens: DashMap::new(),
        }
    }

    /// Generates, records, and returns a fresh token.
    ///
    /// Expired tokens are purged on every issue, so the store never grows
    /// past the number of tokens issued in one lifetime window.
    pub fn issue(&self) -> String {
        self.purge_expired();

        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        let token = hex::encode(Sha256::digest(seed));

        let expires = Instant::now() + Duration::from_secs(self.config.ttl_secs);
        self.tokens.insert(token.clone(), expires);
        token
    }

    /// Checks a submitted token against the store.
    ///
    /// Unknown and expired tokens fail; an expired token is removed on the
    /// way out. With `single_use` enabled a successful validation consumes
    /// the token.
    pub fn validate(&self, token: &str) -> bool {
        let now = Instant::now();

        if self.config.single_use {
            return self
                .tokens
                .remove(token)
                .is_some_and(|(_, expires)| now < expires);
        }

        let Some(expires) = self.tokens.get(token).map(|entry| *entry.value()) else {
            return false;
        };
        if now >= expires {
            self.tokens.remove(token);
            return false;
        }
        true
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        let before = self.tokens.len();
        self.tokens.retain(|_, expires| *expires > now);

        let purged = before.saturating_sub(self.tokens.len());
        if purged > 0 {
            tracing::trace!(purged, "expired CSRF tokens purged");
        }
    }
}
