//! The service controller: wires configuration into running components.

use std::sync::{Arc, LazyLock};

use missive_common::{Environment, Signal, logging};
use missive_delivery::{Mailer, SiteConfig, SmtpConfig};
use missive_http::{AppState, ContactServer, HttpConfig};
use missive_policy::{
    CsrfConfig, CsrfTokenStore, RateLimitConfig, RateLimiter, SpamConfig, SpamFilter,
};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{error, info};

/// The assembled service, one configuration section per component.
///
/// Deserialised from the RON configuration file; every section falls back
/// to its defaults when absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Missive {
    pub(crate) http: HttpConfig,
    pub(crate) smtp: SmtpConfig,
    pub(crate) site: SiteConfig,
    pub(crate) csrf: CsrfConfig,
    pub(crate) rate_limit: RateLimitConfig,
    pub(crate) spam: SpamConfig,
    pub(crate) environment: Environment,
}

/// Shutdown channel shared by the signal watcher and the server.
pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// Waits for Ctrl-C or SIGTERM, then broadcasts the shutdown signal.
async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
        }
        _ = terminate.recv() => {
            info!("terminate signal received, shutting down");
        }
    }

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::Interrupted, error.to_string()))?;

    Ok(())
}

impl Missive {
    /// Runs the service until a shutdown signal arrives and the server has
    /// drained.
    ///
    /// # Errors
    ///
    /// Returns an error if startup verification fails, the listener cannot
    /// bind, or the server loop fails.
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();

        if self.environment.is_development() {
            info!("development mode: messages will be logged instead of sent");
        }

        let verify_on_startup = self.smtp.verify_on_startup;
        let mailer = Mailer::new(self.smtp, self.site, self.environment);
        if verify_on_startup {
            mailer.verify().await?;
            info!("smtp relay verified");
        }

        let state = AppState {
            tokens: Arc::new(CsrfTokenStore::new(self.csrf)),
            limiter: Arc::new(RateLimiter::new(self.rate_limit)),
            spam: Arc::new(SpamFilter::new(self.spam)),
            mailer: Arc::new(mailer),
        };

        let server = ContactServer::new(&self.http, state).await?;

        info!("controller running");

        tokio::spawn(async {
            if let Err(error) = shutdown().await {
                error!(%error, "signal watcher failed");
            }
        });

        server.serve(SHUTDOWN_BROADCAST.subscribe()).await?;

        info!("controller stopped");
        Ok(())
    }

    /// Probes the configured SMTP relay and exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, TLS negotiation, or
    /// authentication fails.
    pub async fn check_smtp(self) -> anyhow::Result<()> {
        logging::init();

        let host = self.smtp.host.clone();
        let port = self.smtp.port;

        let mailer = Mailer::new(self.smtp, self.site, self.environment);
        mailer.verify().await?;

        info!(host, port, "smtp relay reachable");
        Ok(())
    }
}
