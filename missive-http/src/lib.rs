//! HTTP surface of the missive contact-form service.
//!
//! A single axum router exposes `/api/contact`:
//!
//! - **GET** with `?csrf=true` issues a CSRF token; without the flag it
//!   reports that the endpoint is alive.
//! - **POST** runs the submission pipeline: rate limit first, then form
//!   parsing, field validation and spam screening (all failures collected
//!   into one error map), and finally SMTP dispatch.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use missive_common::Environment;
//! use missive_delivery::{Mailer, SiteConfig, SmtpConfig};
//! use missive_http::{AppState, ContactServer, HttpConfig};
//! use missive_policy::{
//!     CsrfConfig, CsrfTokenStore, RateLimitConfig, RateLimiter, SpamConfig, SpamFilter,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     tokens: Arc::new(CsrfTokenStore::new(CsrfConfig::default())),
//!     limiter: Arc::new(RateLimiter::new(RateLimitConfig::default())),
//!     spam: Arc::new(SpamFilter::new(SpamConfig::default())),
//!     mailer: Arc::new(Mailer::new(
//!         SmtpConfig::default(),
//!         SiteConfig::default(),
//!         Environment::Development,
//!     )),
//! };
//!
//! let server = ContactServer::new(&HttpConfig::default(), state).await?;
//! // server.serve(shutdown_receiver).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod responses;
mod server;
mod state;
mod validate;

pub use config::HttpConfig;
pub use error::HttpError;
pub use server::ContactServer;
pub use state::AppState;
