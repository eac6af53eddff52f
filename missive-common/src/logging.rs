//! Global tracing subscriber setup shared by the binary and the test
//! harnesses.

use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Log level from the `LOG_LEVEL` environment variable, defaulting to TRACE
/// in debug builds and INFO otherwise.
fn level_filter() -> LevelFilter {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    std::env::var("LOG_LEVEL").map_or(default, |raw| {
        LevelFilter::from_str(raw.as_str()).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {raw}, defaulting to {default}");
            default
        })
    })
}

/// Installs the global subscriber: compact single-line output with RFC 3339
/// UTC timestamps, restricted to this workspace's crates.
pub fn init() {
    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level_filter())
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("missive")
                })),
        )
        .init();
}
