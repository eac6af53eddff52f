//! Per-client rate limiting using a fixed window counter.
//!
//! Each client key (normally an IP address) gets a window of
//! `window_secs` starting at its first request; up to `max_requests`
//! submissions are admitted inside it. Once the window ages out, the next
//! request starts a fresh one. A fixed window is deliberately forgiving at
//! the boundary; contact forms need protection from floods, not precise
//! shaping.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Configuration for per-client rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window, per client.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

const fn default_max_requests() -> u32 {
    5
}

const fn default_window_secs() -> u64 {
    3600 // One hour
}

/// Counter for a single client's current window.
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            count: 0,
        }
    }

    /// Counts this request against the window, resetting it first when it
    /// has aged out. Returns `false` when the client is over its limit.
    fn try_admit(&mut self, max_requests: u32, window: Duration) -> bool {
        if self.started.elapsed() >= window {
            self.started = Instant::now();
            self.count = 0;
        }

        if self.count < max_requests {
            self.count += 1;
            true
        } else {
            false
        }
    }

    fn time_remaining(&self, window: Duration) -> Duration {
        window.saturating_sub(self.started.elapsed())
    }
}

/// Per-client rate limiter over an in-process map.
///
/// The map is never swept; a contact endpoint sees few distinct clients
/// per process lifetime and each entry is two machine words.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, Arc<parking_lot::Mutex<Window>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// The configured window length, for `Retry-After` headers.
    #[must_use]
    pub const fn window_secs(&self) -> u64 {
        self.config.window_secs
    }

    /// Checks and counts a request from `key`.
    ///
    /// # Errors
    ///
    /// Returns the time remaining in the client's window when the client
    /// is over its limit. The denied request is not counted.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        let window = Duration::from_secs(self.config.window_secs);
        let entry = self.get_window(key);
        let mut entry = entry.lock();

        if entry.try_admit(self.config.max_requests, window) {
            Ok(())
        } else {
            let remaining = entry.time_remaining(window);
            drop(entry);
            tracing::debug!(
                client = key,
                remaining_seconds = remaining.as_secs(),
                "rate limit exceeded"
            );
            Err(remaining)
        }
    }

    fn get_window(&self, key: &str) -> Arc<parking_lot::Mutex<Window>> {
        self.windows
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(parking_lot::Mutex::new(Window::new())))
            .clone()
    }
}
