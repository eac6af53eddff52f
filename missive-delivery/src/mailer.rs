//! The dispatcher: renders a submission into two messages and relays both.

use missive_common::Environment;
use missive_smtp::MessageBuilder;

use crate::config::{SiteConfig, SmtpConfig};
use crate::error::{DeliveryError, DispatchError};
use crate::submission::{RequestMeta, Submission};
use crate::templates::{self, RenderedMail};
use crate::transaction::{self, SmtpTransaction};

/// Sends contact-form mail through the configured relay.
///
/// In the development environment the mailer renders and logs messages
/// without opening connections, so the form can be exercised end to end
/// with no relay at hand.
#[derive(Debug)]
pub struct Mailer {
    smtp: SmtpConfig,
    site: SiteConfig,
    environment: Environment,
}

impl Mailer {
    #[must_use]
    pub const fn new(smtp: SmtpConfig, site: SiteConfig, environment: Environment) -> Self {
        Self {
            smtp,
            site,
            environment,
        }
    }

    /// Sends the owner notification and the visitor confirmation.
    ///
    /// Both sends are attempted regardless of the first outcome; the
    /// notification must not be lost to a bad visitor address, and the
    /// confirmation must not be lost to a full owner mailbox.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when either send fails. There are no
    /// retries; the caller reports the failure to the visitor.
    pub async fn dispatch(
        &self,
        submission: &Submission,
        meta: &RequestMeta,
    ) -> Result<(), DispatchError> {
        let admin = templates::render_admin(&self.site.name, submission, meta);
        let user = templates::render_user(&self.site.name, &self.site.admin_email, submission);

        let outcomes = [
            self.send(&admin, &self.site.admin_email, Some(&submission.email))
                .await,
            self.send(&user, &submission.email, None).await,
        ];

        let attempted = outcomes.len();
        let failures: Vec<DeliveryError> =
            outcomes.into_iter().filter_map(Result::err).collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                attempted,
                failures,
            })
        }
    }

    /// Probes the relay: connect, TLS and AUTH as configured, QUIT.
    ///
    /// Runs against the network even in development mode, since a probe is
    /// only ever requested deliberately.
    ///
    /// # Errors
    ///
    /// Returns the stage failure exactly as a send would.
    pub async fn verify(&self) -> Result<(), DeliveryError> {
        transaction::verify(&self.smtp).await
    }

    async fn send(
        &self,
        mail: &RenderedMail,
        recipient: &str,
        reply_to: Option<&str>,
    ) -> Result<(), DeliveryError> {
        if self.environment.is_development() {
            tracing::info!(
                recipient,
                subject = %mail.subject,
                "development mode, logging message instead of sending"
            );
            tracing::debug!(body = %mail.text, "rendered message");
            return Ok(());
        }

        let mut builder = MessageBuilder::new()
            .from(self.from_header())
            .to(recipient)
            .subject(mail.subject.as_str())
            .text_body(mail.text.as_str())
            .html_body(mail.html.as_str());
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }
        let message = builder
            .build()
            .map_err(|error| DeliveryError::Protocol(error.to_string()))?;

        let result = SmtpTransaction::new(&self.smtp, self.sender_address(), recipient, &message)
            .execute()
            .await;

        match &result {
            Ok(()) => {
                tracing::info!(recipient, subject = %mail.subject, "message accepted by relay");
            }
            Err(error) => {
                tracing::error!(
                    recipient,
                    subject = %mail.subject,
                    kind = %error.kind(),
                    %error,
                    "message delivery failed"
                );
            }
        }
        result
    }

    /// The envelope sender: the SMTP username when configured, otherwise
    /// the owner address.
    fn sender_address(&self) -> &str {
        self.smtp
            .username
            .as_deref()
            .unwrap_or(&self.site.admin_email)
    }

    fn from_header(&self) -> String {
        format!("\"{}\" <{}>", self.site.name, self.sender_address())
    }
}
