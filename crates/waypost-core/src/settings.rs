//! Settings for the waypost router.
//!
//! [`RouterSettings`] holds every tunable of a router with sensible defaults,
//! and [`Mode`] names the location-observation strategy. Settings are plain
//! values: build them in code, or load them with
//! [`settings_loader`](crate::settings_loader).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WaypostError;

/// How the router observes the host location.
///
/// Parsing is case-insensitive, so `"HTML5"` and `"html5"` name the same mode.
///
/// # Examples
///
/// ```
/// use waypost_core::settings::Mode;
///
/// let mode: Mode = "Hash".parse().unwrap();
/// assert_eq!(mode, Mode::Hash);
/// assert_eq!(Mode::Html5.as_str(), "html5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// The route lives in the URL fragment (`/app#/list/shoes`).
    #[default]
    Hash,
    /// The route is the URL path itself (`/list/shoes`).
    Html5,
}

impl Mode {
    /// Returns the canonical lowercase name of this mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Html5 => "html5",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = WaypostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "html5" => Ok(Self::Html5),
            other => Err(WaypostError::ConfigurationError(format!(
                "Unknown router mode '{other}', expected 'hash' or 'html5'"
            ))),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = WaypostError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// The complete set of router settings.
///
/// # Examples
///
/// ```
/// use waypost_core::settings::{Mode, RouterSettings};
///
/// let settings = RouterSettings::default();
/// assert_eq!(settings.mode, Mode::Hash);
/// assert_eq!(settings.default_target, "#main");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSettings {
    // ── Routing ──────────────────────────────────────────────────────

    /// The initial location-observation mode.
    pub mode: Mode,
    /// Mount point used by routes that do not name a target.
    pub default_target: String,
    /// Data key under which a view receives the current location.
    pub data_key: String,
    /// Lifecycle hook invoked on a view each time its route matches.
    pub route_hook: String,
    /// Keep dispatching when a listener fails, logging the failure instead
    /// of aborting the navigation.
    pub isolate_listener_errors: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// Tracing filter directive (e.g. "info", "waypost_router=debug").
    pub log_level: String,
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Hash,
            default_target: "#main".to_string(),
            data_key: "route".to_string(),
            route_hook: "route".to_string(),
            isolate_listener_errors: false,
            log_level: "info".to_string(),
            debug: false,
        }
    }
}
