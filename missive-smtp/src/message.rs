//! RFC 5322 message construction.

use std::io::Write;

use chrono::Utc;

use crate::error::{ClientError, Result};

/// Builder for contact-style messages with a plain-text and an HTML
/// rendering of the same content.
///
/// With both bodies set, `build` produces a `multipart/alternative`
/// message with the plain-text part first, so readers prefer the HTML
/// part but can always fall back.
///
/// # Examples
///
/// ```no_run
/// use missive_smtp::MessageBuilder;
///
/// let message = MessageBuilder::new()
///     .from("\"Website\" <noreply@example.com>")
///     .to("owner@example.com")
///     .subject("New message")
///     .text_body("Hello")
///     .html_body("<p>Hello</p>")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    reply_to: Option<String>,
    subject: Option<String>,
    headers: Vec<(String, String)>,
    text_body: Option<String>,
    html_body: Option<String>,
}

impl MessageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the From header. May carry a display name.
    #[must_use]
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Adds a recipient to the To header.
    #[must_use]
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Sets the Reply-To header.
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Sets the Subject header.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a custom header. Headers are emitted in insertion order.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text_body(mut self, content: impl Into<String>) -> Self {
        self.text_body = Some(content.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, content: impl Into<String>) -> Self {
        self.html_body = Some(content.into());
        self
    }

    /// Renders the message, headers and body, as wire-ready text.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn build(self) -> Result<String> {
        let mut message = Vec::with_capacity(1024);

        if let Some(from) = &self.from {
            write!(&mut message, "From: {from}\r\n")?;
        }
        if !self.to.is_empty() {
            write!(&mut message, "To: {}\r\n", self.to.join(", "))?;
        }
        if let Some(reply_to) = &self.reply_to {
            write!(&mut message, "Reply-To: {reply_to}\r\n")?;
        }
        if let Some(subject) = &self.subject {
            write!(&mut message, "Subject: {subject}\r\n")?;
        }
        write!(&mut message, "Date: {}\r\n", Utc::now().to_rfc2822())?;
        for (name, value) in &self.headers {
            write!(&mut message, "{name}: {value}\r\n")?;
        }
        write!(&mut message, "MIME-Version: 1.0\r\n")?;

        match (&self.text_body, &self.html_body) {
            (Some(text), Some(html)) => {
                let boundary = boundary();
                write!(
                    &mut message,
                    "Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\r\n"
                )?;
                write!(&mut message, "--{boundary}\r\n")?;
                write!(&mut message, "Content-Type: text/plain; charset=utf-8\r\n\r\n")?;
                write!(&mut message, "{text}\r\n")?;
                write!(&mut message, "--{boundary}\r\n")?;
                write!(&mut message, "Content-Type: text/html; charset=utf-8\r\n\r\n")?;
                write!(&mut message, "{html}\r\n")?;
                write!(&mut message, "--{boundary}--\r\n")?;
            }
            (Some(text), None) => {
                write!(&mut message, "Content-Type: text/plain; charset=utf-8\r\n\r\n")?;
                write!(&mut message, "{text}")?;
            }
            (None, Some(html)) => {
                write!(&mut message, "Content-Type: text/html; charset=utf-8\r\n\r\n")?;
                write!(&mut message, "{html}")?;
            }
            (None, None) => {
                write!(&mut message, "Content-Type: text/plain; charset=utf-8\r\n\r\n")?;
            }
        }

        String::from_utf8(message).map_err(|error| ClientError::Utf8(error.utf8_error()))
    }
}

/// Generates a MIME boundary unlikely to collide with body content.
fn boundary() -> String {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    format!("=_missive_{stamp:032x}")
}
