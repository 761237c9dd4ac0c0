//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL holds filter directives, e.g. "debug" or
//!   "info,course=debug,generation=debug,conversation=debug".
//! - LOG_FORMAT picks "pretty" (default) or "json".
//!
//! Log targets used across the backend: `adventure_backend` (startup, WS),
//! `session` (module mounts), `course` (quizzes, unlocks), `generation`
//! (single-shot AI calls) and `conversation` (chat turns). Per-request spans
//! come from the tower-http TraceLayer.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "info,adventure_backend=debug,session=debug,course=debug,generation=info,conversation=info,tower_http=info,axum=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn filter_from(raw: Option<String>) -> EnvFilter {
    raw.filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let filter = filter_from(std::env::var("LOG_LEVEL").ok());
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_defaults_to_pretty() {
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("text")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
    }

    #[test]
    fn unusable_filter_falls_back_to_default() {
        assert_eq!(filter_from(None).to_string(), EnvFilter::new(DEFAULT_FILTER).to_string());
        assert_eq!(filter_from(Some("  ".into())).to_string(), EnvFilter::new(DEFAULT_FILTER).to_string());
        assert_ne!(filter_from(Some("course=trace".into())).to_string(), EnvFilter::new(DEFAULT_FILTER).to_string());
    }
}
