//! Outbound mail for the contact form: rendering and SMTP dispatch.
//!
//! A submission produces two messages, a notification to the site owner
//! and a confirmation to the visitor. [`Mailer::dispatch`] renders both
//! and relays them over fresh SMTP connections; there is no queue and no
//! retry, a failed dispatch surfaces to the caller immediately.

pub mod config;
pub mod error;
pub mod mailer;
pub mod submission;
pub mod templates;

mod transaction;

pub use config::{SiteConfig, SmtpConfig, SmtpTimeouts};
pub use error::{DeliveryError, DispatchError, FailureKind};
pub use mailer::Mailer;
pub use submission::{RequestMeta, Submission};
pub use templates::RenderedMail;
