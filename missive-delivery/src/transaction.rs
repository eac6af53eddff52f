//! One SMTP transaction against the configured relay.
//!
//! Connection, TLS negotiation, authentication, envelope, content, QUIT.
//! Every protocol stage runs under its configured timeout. Connections are
//! never reused; a contact form sends far too rarely for pooling to earn
//! its complexity.

use std::future::Future;
use std::time::Duration;

use missive_common::tls::TlsMode;
use missive_smtp::{Reply, SmtpClient};

use crate::config::SmtpConfig;
use crate::error::DeliveryError;

/// A single message delivery over a fresh connection.
pub(crate) struct SmtpTransaction<'a> {
    config: &'a SmtpConfig,
    sender: &'a str,
    recipient: &'a str,
    message: &'a str,
}

impl<'a> SmtpTransaction<'a> {
    pub(crate) const fn new(
        config: &'a SmtpConfig,
        sender: &'a str,
        recipient: &'a str,
        message: &'a str,
    ) -> Self {
        Self {
            config,
            sender,
            recipient,
            message,
        }
    }

    /// Runs the transaction to completion.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. A QUIT failure after the relay has
    /// accepted the message is logged and swallowed.
    pub(crate) async fn execute(self) -> Result<(), DeliveryError> {
        let timeouts = &self.config.timeouts;
        let mut client = establish(self.config).await?;

        let reply = timed("MAIL FROM", timeouts.command(), client.mail_from(self.sender)).await?;
        if !reply.is_success() {
            return Err(rejected("MAIL FROM", &reply));
        }

        let reply = timed("RCPT TO", timeouts.command(), client.rcpt_to(self.recipient)).await?;
        if !reply.is_success() {
            return Err(rejected("RCPT TO", &reply));
        }

        let reply = timed("DATA", timeouts.command(), client.data()).await?;
        if reply.code != 354 {
            return Err(rejected("DATA", &reply));
        }

        let reply = timed("message content", timeouts.data(), client.send_data(self.message)).await?;
        if !reply.is_success() {
            return Err(rejected("message content", &reply));
        }

        quit_quietly(&mut client, timeouts.quit()).await;
        Ok(())
    }
}

/// Connects and walks the session up to the point where MAIL FROM may be
/// sent: TCP connect, TLS per configuration, greeting, EHLO, AUTH.
pub(crate) async fn establish(config: &SmtpConfig) -> Result<SmtpClient, DeliveryError> {
    let timeouts = &config.timeouts;
    let mode = config.tls.mode.resolve(config.port);

    if config.tls.accept_invalid_certs {
        tracing::warn!(
            host = %config.host,
            "TLS certificate validation is disabled for the relay connection"
        );
    }

    let mut client = timed(
        "connect",
        timeouts.connect(),
        SmtpClient::connect(&config.host, config.port),
    )
    .await?
    .accept_invalid_certs(config.tls.accept_invalid_certs);

    if mode == TlsMode::Implicit {
        timed("TLS handshake", timeouts.command(), client.establish_tls()).await?;
    }

    let greeting = timed("greeting", timeouts.command(), client.read_greeting()).await?;
    if !greeting.is_success() {
        return Err(rejected("connection greeting", &greeting));
    }

    let ehlo = timed("EHLO", timeouts.command(), client.ehlo(&config.helo_domain)).await?;
    if !ehlo.is_success() {
        return Err(rejected("EHLO", &ehlo));
    }

    if mode == TlsMode::Starttls {
        let advertised = ehlo
            .lines
            .iter()
            .any(|line| line.to_uppercase().contains("STARTTLS"));

        if advertised {
            let reply = timed("STARTTLS", timeouts.command(), client.starttls()).await?;
            if !reply.is_success() {
                // Credentials never go over a channel that refused to
                // upgrade after offering to.
                return Err(DeliveryError::Tls(format!(
                    "server refused STARTTLS: {} {}",
                    reply.code,
                    reply.text()
                )));
            }

            // RFC 3207: the session state resets, EHLO again.
            let ehlo = timed("EHLO", timeouts.command(), client.ehlo(&config.helo_domain)).await?;
            if !ehlo.is_success() {
                return Err(rejected("EHLO after STARTTLS", &ehlo));
            }
        } else {
            tracing::debug!(
                host = %config.host,
                "relay does not advertise STARTTLS, continuing in the clear"
            );
        }
    }

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        let reply = timed("AUTH", timeouts.command(), client.auth_plain(username, password)).await?;
        if !reply.is_success() {
            return Err(DeliveryError::Authentication {
                code: reply.code,
                message: reply.text(),
            });
        }
    }

    Ok(client)
}

/// Connectivity probe: a full session establishment followed by QUIT,
/// without an envelope.
pub(crate) async fn verify(config: &SmtpConfig) -> Result<(), DeliveryError> {
    let mut client = establish(config).await?;
    quit_quietly(&mut client, config.timeouts.quit()).await;
    Ok(())
}

async fn quit_quietly(client: &mut SmtpClient, limit: Duration) {
    if let Err(error) = timed("QUIT", limit, client.quit()).await {
        tracing::debug!(%error, "QUIT failed after the relay accepted our traffic");
    }
}

/// Runs one client operation under a timeout, folding both failure shapes
/// into [`DeliveryError`].
async fn timed<T>(
    operation: &'static str,
    limit: Duration,
    future: impl Future<Output = missive_smtp::Result<T>>,
) -> Result<T, DeliveryError> {
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result.map_err(DeliveryError::from),
        Err(_) => Err(DeliveryError::Timeout {
            operation,
            seconds: limit.as_secs(),
        }),
    }
}

fn rejected(stage: &'static str, reply: &Reply) -> DeliveryError {
    DeliveryError::Rejected {
        stage,
        code: reply.code,
        message: reply.text(),
    }
}
