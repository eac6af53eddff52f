//! Async SMTP client for submitting mail to a configured relay.
//!
//! This crate covers exactly what an outbound submission agent needs:
//!
//! - Plain TCP, implicit TLS (SMTPS), and STARTTLS upgrades
//! - Relaxed certificate checking behind an explicit flag, for relays that
//!   terminate TLS with a self-signed bridge certificate
//! - `AUTH PLAIN` credentials
//! - Multi-line reply parsing with 2xx/4xx/5xx classification
//! - A builder for `multipart/alternative` messages (plain text + HTML)
//!
//! Connection management, timeouts, and retry policy are the caller's
//! responsibility; every method here performs a single protocol step.

mod client;
mod error;
mod message;
mod reply;

pub use client::SmtpClient;
pub use error::{ClientError, Result};
pub use message::MessageBuilder;
pub use reply::Reply;
