//! # waypost-router
//!
//! A client-side navigation router. It maps a changing location to the first
//! matching route, extracts path parameters into the query, notifies
//! listeners, and keeps at most one view mounted for the matched route.
//!
//! ## Modules
//!
//! - [`pattern`]: `/:name` route patterns and the [`Matcher`](pattern::Matcher) capability
//! - [`table`]: the insertion-ordered route table and route configuration
//! - [`url`]: raw URL parsing into path and query
//! - [`location`]: the location handed to listeners, handlers, and views
//! - [`view`]: the view and mount-point capabilities
//! - [`reconciler`]: mounted-view bookkeeping
//! - [`dispatcher`]: the location-change pipeline
//! - [`locator`]: location observation, with a headless in-memory locator
//! - [`router`]: the public router facade
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use waypost_router::locator::{memory_locator_factory, History};
//! use waypost_router::{RouteConfig, Router};
//!
//! let history = History::new("/#/user/42");
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//!
//! let mut router = Router::builder()
//!     .locator_factory(memory_locator_factory(Arc::clone(&history)))
//!     .build();
//! router
//!     .add(RouteConfig::new("/user/:id").handler(move |location| {
//!         sink.lock().unwrap().push(location.query["id"].clone());
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! router.start().unwrap();
//! router.navigate("/user/7").unwrap();
//! assert_eq!(*seen.lock().unwrap(), vec!["42", "7"]);
//! ```

pub mod dispatcher;
pub mod locator;
pub mod location;
pub mod pattern;
pub mod reconciler;
pub mod router;
pub mod table;
pub mod url;
pub mod view;

pub use dispatcher::{Dispatcher, Listener, Navigation};
pub use location::{Location, Redirect};
pub use pattern::{Matcher, Rule};
pub use router::{Router, RouterBuilder};
pub use table::{RouteConfig, RouteEntry, RouteId, RouteTable};
pub use view::{MountPoint, MountResolver, View, ViewFactory};
pub use waypost_core::settings::Mode;
pub use waypost_core::{WaypostError, WaypostResult};

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
