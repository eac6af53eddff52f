//! Configuration discovery, parsing, and environment overrides.
//!
//! The configuration file is optional; when absent the service runs on
//! built-in defaults, which suit a relay on localhost. Environment
//! variables matching the deployment surface override whatever the file
//! provides.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use crate::controller::Missive;

/// Loads the configuration.
///
/// Discovery order:
/// 1. the `MISSIVE_CONFIG` environment variable,
/// 2. `./missive.config.ron`,
/// 3. `/etc/missive/missive.config.ron`.
///
/// A missing file is not an error. Environment overrides (`SMTP_HOST`,
/// `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS`, `ADMIN_EMAIL`, `WEBSITE_NAME`,
/// `MISSIVE_ENV`) are applied after the file.
///
/// # Errors
///
/// Returns an error if `MISSIVE_CONFIG` points at a non-existent file, or
/// if the discovered file cannot be read or parsed.
pub fn load() -> anyhow::Result<Missive> {
    let mut config = match find_config_file()? {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config from {}", path.display()))?;
            let config = ron::from_str(&content)
                .with_context(|| format!("failed to parse config from {}", path.display()))?;
            info!(path = %path.display(), "configuration loaded");
            config
        }
        None => {
            info!("no configuration file found, using defaults");
            Missive::default()
        }
    };

    apply_env(&mut config);
    Ok(config)
}

fn find_config_file() -> anyhow::Result<Option<PathBuf>> {
    if let Ok(env_path) = std::env::var("MISSIVE_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        anyhow::bail!(
            "MISSIVE_CONFIG points to a non-existent file: {}",
            path.display()
        );
    }

    Ok([
        PathBuf::from("./missive.config.ron"),
        PathBuf::from("/etc/missive/missive.config.ron"),
    ]
    .into_iter()
    .find(|path| path.exists()))
}

fn apply_env(config: &mut Missive) {
    if let Ok(host) = std::env::var("SMTP_HOST") {
        config.smtp.host = host;
    }
    if let Ok(port) = std::env::var("SMTP_PORT") {
        match port.parse() {
            Ok(port) => config.smtp.port = port,
            Err(error) => warn!(%error, %port, "ignoring unparsable SMTP_PORT"),
        }
    }
    if let Ok(username) = std::env::var("SMTP_USER") {
        config.smtp.username = Some(username);
    }
    if let Ok(password) = std::env::var("SMTP_PASS") {
        config.smtp.password = Some(password);
    }
    if let Ok(admin_email) = std::env::var("ADMIN_EMAIL") {
        config.site.admin_email = admin_email;
    }
    if let Ok(name) = std::env::var("WEBSITE_NAME") {
        config.site.name = name;
    }
    if let Ok(environment) = std::env::var("MISSIVE_ENV") {
        match environment.parse() {
            Ok(environment) => config.environment = environment,
            Err(error) => warn!(%error, "ignoring unrecognised MISSIVE_ENV"),
        }
    }
}
