//! Logging setup shared by binaries embedding the pipeline.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Crate target prefix used for the per-crate level directive.
pub const TARGET_PREFIX: &str = "embed_pipeline";

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Compact single-line formatting layer writing to stderr.
///
/// Stdout stays free for the run report. ANSI colors only when stderr is a terminal.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(io::stderr)
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(io::stderr().is_terminal())
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .compact()
}

/// Level directive for **this** library only, e.g. `embed_pipeline=debug`.
pub fn level_directive(level: Level) -> Option<Directive> {
    let s = format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).ok()
}

/// EnvFilter from `RUST_LOG` when set and valid; otherwise `default` plus a
/// per-crate level for this library.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_for(rust_log.as_deref(), default, level)
}

fn filter_for(rust_log: Option<&str>, default: &str, level: Level) -> EnvFilter {
    if let Some(filter) = rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
    {
        return filter;
    }

    let base = EnvFilter::new(default);
    match level_directive(level) {
        Some(d) => base.add_directive(d),
        None => base,
    }
}

/// Installs the global subscriber: env filter + [`layer`].
///
/// # Errors
/// Fails if a global subscriber is already set.
pub fn init(default: &str, level: Level) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter_with_level(default, level))
        .with(layer())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_targets_this_crate() {
        let d = level_directive(Level::DEBUG).unwrap();
        assert_eq!(d.to_string(), "embed_pipeline=debug");
    }

    #[test]
    fn rust_log_wins_over_crate_directive() {
        let f = filter_for(Some("embed_pipeline=debug"), "info", Level::INFO).to_string();
        assert!(f.contains("embed_pipeline=debug"));
        assert!(!f.contains("embed_pipeline=info"));
    }

    #[test]
    fn crate_directive_applies_without_rust_log() {
        let f = filter_for(None, "warn", Level::INFO).to_string();
        assert!(f.contains("embed_pipeline=info"));
        assert!(f.contains("warn"));
    }
}
