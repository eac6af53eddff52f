//! Shared state behind the contact handlers.

use std::sync::Arc;

use missive_delivery::Mailer;
use missive_policy::{CsrfTokenStore, RateLimiter, SpamFilter};

/// Handles to the policy stores and the dispatcher.
///
/// Cloned into every handler invocation; the stores synchronise
/// internally, so no outer lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<CsrfTokenStore>,
    pub limiter: Arc<RateLimiter>,
    pub spam: Arc<SpamFilter>,
    pub mailer: Arc<Mailer>,
}
