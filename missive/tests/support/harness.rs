//! End-to-end test harness for the contact API.
//!
//! Assembles the full service in-process: policy stores, dispatcher and
//! HTTP listener on an ephemeral port, plus a recording mock relay the
//! dispatcher delivers to. Tests drive it over real HTTP with `reqwest`
//! and assert on what reached the relay.
//!
//! # Example
//!
//! ```no_run
//! use support::harness::TestHarness;
//!
//! #[tokio::test]
//! async fn test_submission() {
//!     let harness = TestHarness::builder().build().await.unwrap();
//!
//!     let token = harness.csrf_token().await.unwrap();
//!     let response = harness
//!         .submit(&[
//!             ("name", "Jane Doe"),
//!             ("email", "jane@example.com"),
//!             ("message", "I would like to talk about a project."),
//!             ("disclaimer", "on"),
//!             ("csrf_token", &token),
//!         ])
//!         .await
//!         .unwrap();
//!     assert_eq!(response.status(), 200);
//!
//!     harness.shutdown().await;
//! }
//! ```

use std::{sync::Arc, time::Duration};

use missive_common::{Environment, Signal};
use missive_delivery::{Mailer, SiteConfig, SmtpConfig};
use missive_http::{AppState, ContactServer, HttpConfig, HttpError};
use missive_policy::{
    CsrfConfig, CsrfTokenStore, RateLimitConfig, RateLimiter, SpamConfig, SpamFilter,
};
use tokio::{net::TcpListener, sync::broadcast, task::JoinHandle, time::timeout};

use super::mock_server::{MockSmtpServer, ReceivedMessage};

/// A running contact-form service plus the relay it delivers to.
///
/// The HTTP listener is bound before `build` returns, so requests can be
/// issued immediately; no startup polling is needed.
pub struct TestHarness {
    /// Full URL of the contact endpoint.
    base_url: String,

    client: reqwest::Client,

    /// The relay the dispatcher targets. `None` when the harness was
    /// built with an unreachable relay.
    relay: Option<MockSmtpServer>,

    server_handle: JoinHandle<Result<(), HttpError>>,

    shutdown_tx: broadcast::Sender<Signal>,
}

impl TestHarness {
    #[must_use]
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Full URL of the contact endpoint.
    #[must_use]
    #[allow(dead_code)] // Available for tests that build requests by hand.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches a CSRF token from `GET ?csrf=true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no
    /// `csrfToken` field.
    pub async fn csrf_token(&self) -> anyhow::Result<String> {
        let body: serde_json::Value = self
            .client
            .get(format!("{}?csrf=true", self.base_url))
            .send()
            .await?
            .json()
            .await?;

        body.get("csrfToken")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("no csrfToken in response: {body}"))
    }

    /// Posts the given fields as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    pub async fn submit(&self, fields: &[(&str, &str)]) -> anyhow::Result<reqwest::Response> {
        Ok(self.client.post(&self.base_url).form(fields).send().await?)
    }

    /// Every message the relay accepted so far.
    ///
    /// # Panics
    ///
    /// Panics when the harness was built with an unreachable relay.
    pub async fn relay_messages(&self) -> Vec<ReceivedMessage> {
        self.relay().messages().await
    }

    /// How many connections the relay has seen.
    ///
    /// # Panics
    ///
    /// Panics when the harness was built with an unreachable relay.
    pub fn relay_connection_count(&self) -> usize {
        self.relay().connection_count()
    }

    fn relay(&self) -> &MockSmtpServer {
        self.relay
            .as_ref()
            .expect("harness was built without a reachable relay")
    }

    /// Stops the HTTP server and waits for it to drain.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(Signal::Shutdown);
        let _ = timeout(Duration::from_secs(5), self.server_handle).await;
    }
}

/// Builder for the harness.
pub struct TestHarnessBuilder {
    rate_limit: RateLimitConfig,
    unreachable_relay: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            unreachable_relay: false,
        }
    }

    /// Override the rate limit (default: 5 requests per hour).
    #[must_use]
    pub const fn with_rate_limit(mut self, max_requests: u32, window_secs: u64) -> Self {
        self.rate_limit.max_requests = max_requests;
        self.rate_limit.window_secs = window_secs;
        self
    }

    /// Point the dispatcher at a closed port instead of a live relay.
    #[must_use]
    pub const fn with_unreachable_relay(mut self) -> Self {
        self.unreachable_relay = true;
        self
    }

    /// Builds and starts the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay or the HTTP listener fails to bind.
    pub async fn build(self) -> anyhow::Result<TestHarness> {
        let (relay, relay_port) = if self.unreachable_relay {
            // Bind and immediately drop a listener so the port is known
            // to be closed rather than filtered.
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            let port = listener.local_addr()?.port();
            drop(listener);
            (None, port)
        } else {
            let relay = MockSmtpServer::start().await?;
            let port = relay.addr().port();
            (Some(relay), port)
        };

        let smtp = SmtpConfig {
            host: "127.0.0.1".to_owned(),
            port: relay_port,
            ..SmtpConfig::default()
        };
        let site = SiteConfig {
            name: "Acme Studio".to_owned(),
            admin_email: "owner@acme.test".to_owned(),
        };

        let state = AppState {
            tokens: Arc::new(CsrfTokenStore::new(CsrfConfig::default())),
            limiter: Arc::new(RateLimiter::new(self.rate_limit)),
            spam: Arc::new(SpamFilter::new(SpamConfig::default())),
            mailer: Arc::new(Mailer::new(smtp, site, Environment::Production)),
        };

        let http = HttpConfig {
            listen_address: "127.0.0.1:0".to_owned(),
            ..HttpConfig::default()
        };
        let server = ContactServer::new(&http, state).await?;
        let base_url = format!("http://{}/api/contact", server.local_addr()?);

        let (shutdown_tx, _) = broadcast::channel(16);
        let server_handle = tokio::spawn(server.serve(shutdown_tx.subscribe()));

        Ok(TestHarness {
            base_url,
            client: reqwest::Client::new(),
            relay,
            server_handle,
            shutdown_tx,
        })
    }
}
