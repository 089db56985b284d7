//! Logging integration for waypost.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`RouterSettings`] and for creating per-dispatch spans.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::RouterSettings;

/// Directives used when `log_level` cannot be parsed.
const FALLBACK_DIRECTIVES: &str = "info";

/// Installs the global subscriber described by `settings`.
///
/// `settings.log_level` holds filter directives such as `"debug"` or
/// `"waypost_router=trace"`. Debug settings log pretty multi-line events with
/// source locations; otherwise each event is one JSON object carrying the
/// current dispatch span. Only the first call installs anything.
pub fn setup_logging(settings: &RouterSettings) {
    let (pretty, json) = if settings.debug {
        let layer = fmt::layer().pretty().with_file(true).with_line_number(true);
        (Some(layer), None)
    } else {
        (None, Some(fmt::layer().json().with_current_span(true)))
    };

    let installed = tracing_subscriber::registry()
        .with(router_filter(&settings.log_level))
        .with(pretty)
        .with(json)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(directives = %settings.log_level, debug = settings.debug, "logging ready");
    }
}

fn router_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVES))
}

/// Creates a tracing span for one location-change dispatch.
///
/// Everything logged while matching, notifying listeners, and reconciling
/// views for this location carries the raw URL.
///
/// # Examples
///
/// ```
/// use waypost_core::logging::dispatch_span;
///
/// let span = dispatch_span("/list/shoes");
/// let _guard = span.enter();
/// tracing::debug!("matching");
/// ```
pub fn dispatch_span(url: &str) -> tracing::Span {
    tracing::debug_span!("dispatch", url = url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = RouterSettings {
            log_level: "not a [valid filter".to_string(),
            ..RouterSettings::default()
        };
        setup_logging(&settings);
        setup_logging(&RouterSettings::default());
    }

    #[test]
    fn test_unparsable_level_falls_back() {
        assert_eq!(router_filter("not a [valid filter").to_string(), FALLBACK_DIRECTIVES);
        assert_eq!(router_filter("debug").to_string(), "debug");
    }

    #[test]
    fn test_dispatch_span_enter() {
        let span = dispatch_span("/detail/9");
        let _guard = span.enter();
        tracing::debug!("inside dispatch span");
    }
}
