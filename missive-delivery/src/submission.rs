//! The validated contact-form submission and its request metadata.

use chrono::{DateTime, Utc};

/// A contact-form submission that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
    /// When the service accepted the submission.
    pub received: DateTime<Utc>,
}

impl Submission {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            received: Utc::now(),
        }
    }

    /// The received instant formatted for message bodies, UTC,
    /// e.g. `December 17, 2023 at 03:45 PM`.
    #[must_use]
    pub fn formatted_received(&self) -> String {
        self.received.format("%B %-d, %Y at %I:%M %p").to_string()
    }
}

/// Request details forwarded into the owner notification.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}
