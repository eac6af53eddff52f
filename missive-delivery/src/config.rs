//! Relay and site identity configuration.

use std::time::Duration;

use missive_common::tls::TlsOptions;
use serde::{Deserialize, Serialize};

/// Connection settings for the outbound SMTP relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Relay hostname, also used for TLS server-name verification.
    #[serde(default = "default_host")]
    pub host: String,

    /// Relay port. 465 selects implicit TLS when the mode is `auto`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// AUTH PLAIN username. Also the envelope sender when set.
    #[serde(default)]
    pub username: Option<String>,

    /// AUTH PLAIN password. Authentication runs only when both credentials
    /// are present.
    #[serde(default)]
    pub password: Option<String>,

    /// Hostname announced in EHLO.
    #[serde(default = "default_helo_domain")]
    pub helo_domain: String,

    #[serde(default)]
    pub tls: TlsOptions,

    #[serde(default)]
    pub timeouts: SmtpTimeouts,

    /// Probe the relay once at startup and refuse to serve when it fails.
    #[serde(default)]
    pub verify_on_startup: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            helo_domain: default_helo_domain(),
            tls: TlsOptions::default(),
            timeouts: SmtpTimeouts::default(),
            verify_on_startup: false,
        }
    }
}

fn default_host() -> String {
    "localhost".to_owned()
}

const fn default_port() -> u16 {
    587
}

fn default_helo_domain() -> String {
    "localhost".to_owned()
}

/// Per-operation timeouts for one SMTP transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpTimeouts {
    /// TCP connect, in seconds.
    #[serde(default = "default_connect_secs")]
    pub connect_secs: u64,

    /// Each command/reply exchange (greeting, EHLO, STARTTLS, AUTH,
    /// MAIL FROM, RCPT TO, DATA), in seconds.
    #[serde(default = "default_command_secs")]
    pub command_secs: u64,

    /// Transmitting the message content, in seconds.
    #[serde(default = "default_data_secs")]
    pub data_secs: u64,

    /// QUIT, in seconds. Short because a hung QUIT no longer matters.
    #[serde(default = "default_quit_secs")]
    pub quit_secs: u64,
}

impl SmtpTimeouts {
    #[must_use]
    pub const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub const fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    #[must_use]
    pub const fn data(&self) -> Duration {
        Duration::from_secs(self.data_secs)
    }

    #[must_use]
    pub const fn quit(&self) -> Duration {
        Duration::from_secs(self.quit_secs)
    }
}

impl Default for SmtpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_secs(),
            command_secs: default_command_secs(),
            data_secs: default_data_secs(),
            quit_secs: default_quit_secs(),
        }
    }
}

const fn default_connect_secs() -> u64 {
    10
}

const fn default_command_secs() -> u64 {
    10
}

const fn default_data_secs() -> u64 {
    30
}

const fn default_quit_secs() -> u64 {
    5
}

/// Who the site is: used for subjects, signatures, and the owner
/// notification recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name used in subjects and the From header.
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Recipient of owner notifications, and the fallback sender address
    /// when no SMTP username is configured.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            admin_email: default_admin_email(),
        }
    }
}

fn default_site_name() -> String {
    "Website".to_owned()
}

fn default_admin_email() -> String {
    "webmaster@localhost".to_owned()
}
