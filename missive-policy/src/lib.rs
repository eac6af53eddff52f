//! Admission policy for contact-form submissions.
//!
//! Three independent gates, each cheap enough to run on every request:
//! CSRF token issuance and validation, per-client rate limiting, and a
//! content spam heuristic. All state is in-process; nothing here performs
//! I/O.

pub mod csrf;
pub mod rate_limit;
pub mod spam;

pub use csrf::{CsrfConfig, CsrfTokenStore};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use spam::{SpamConfig, SpamFilter};
