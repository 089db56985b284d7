//! # waypost
//!
//! A client-side navigation router.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `waypost` to get the whole router, or depend on
//! individual crates for finer-grained control.
//!
//! ## Quick start
//!
//! ```
//! use waypost::prelude::*;
//!
//! let settings = RouterSettings::default();
//! waypost::core::logging::setup_logging(&settings);
//!
//! let mut router = Router::builder().settings(settings).build();
//! router.add(RouteConfig::new("/list/:category")).unwrap();
//! router.start().unwrap();
//! assert!(router.is_started());
//! ```

/// Error types, settings, settings loading, and logging setup.
pub use waypost_core as core;

/// Ordered receiver lists used for listeners and locator notifications.
#[cfg(feature = "signals")]
pub use waypost_signals as signals;

/// Patterns, the route table, dispatcher, reconciler, locators, and the router facade.
#[cfg(feature = "router")]
pub use waypost_router as router;

/// Recording views, scripted locators, and listener capture for tests.
#[cfg(feature = "testing")]
pub use waypost_test as test;

// Third-party re-exports
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items, for `use waypost::prelude::*`.
pub mod prelude {
    pub use waypost_core::settings::Mode;
    pub use waypost_core::{RouterSettings, WaypostError, WaypostResult};

    #[cfg(feature = "router")]
    pub use waypost_router::{
        Listener, Location, MountPoint, MountResolver, Navigation, Redirect, RouteConfig, RouteId,
        Router, RouterBuilder, View, ViewFactory,
    };
}

#[cfg(all(test, feature = "router"))]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_router() {
        assert_eq!(VERSION, waypost_router::VERSION);
    }

    #[test]
    fn test_prelude_builds_router() {
        use prelude::*;
        let mut router = Router::new();
        let id = router.add_route(RouteConfig::new("/a")).unwrap();
        assert_eq!(id.get(), 1);
        assert_eq!(router.mode(), Mode::Hash);
    }
}
