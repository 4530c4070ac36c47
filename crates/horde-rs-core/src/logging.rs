//! Logging integration for horde-rs.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-query spans.

use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::Settings;

/// Builds the filter for `settings.log_level`. A directive that does not
/// parse falls back to `info`.
pub fn log_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber described by `settings`.
///
/// Debug mode logs human-readable lines with source locations, so the SQL
/// of each `horde.select` event is easy to read; otherwise every event is a
/// JSON object carrying its `horde.query` span. Returns whether this call
/// installed the subscriber; later calls leave the first one in place.
pub fn setup_logging(settings: &Settings) -> bool {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(log_filter(settings))
        .with_target(true);
    let installed = if settings.debug {
        builder
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        builder.json().with_current_span(true).try_init()
    };
    installed.is_ok()
}

/// Creates a tracing span for one logical query against `table`.
///
/// # Examples
///
/// ```
/// use horde_rs_core::logging::query_span;
///
/// let span = query_span("Customer");
/// let _guard = span.enter();
/// tracing::debug!("building query");
/// ```
pub fn query_span(table: &str) -> tracing::Span {
    tracing::debug_span!("horde.query", table = table)
}
