//! The location-change pipeline.
//!
//! [`Dispatcher::handle_location_change`] runs synchronously for every
//! redirect a locator emits:
//!
//! 1. parse the raw URL into path and query,
//! 2. find the first matching route (no match disposes every mounted view),
//! 3. merge path parameters into the query and attach the referrer,
//! 4. notify listeners in registration order,
//! 5. hand the route and location to the [`Reconciler`].
//!
//! A callback may navigate again while a dispatch is running. The nested
//! dispatch completes first. A listener that navigates makes the outer
//! dispatch skip reconciliation; navigation from a view hook is settled by
//! the reconciler, so the most recent navigation decides what stays mounted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use waypost_core::logging::dispatch_span;
use waypost_core::{RouterSettings, WaypostResult};
use waypost_signals::{Receiver, Signal};

use crate::location::{Location, Redirect};
use crate::reconciler::Reconciler;
use crate::table::{RouteConfig, RouteEntry, RouteId, RouteTable};
use crate::url::{self, UrlParser};
use crate::view::MountResolver;

/// What listeners receive for each matched location.
#[derive(Debug, Clone)]
pub struct Navigation {
    /// The matched route.
    pub route_id: RouteId,
    /// The location, with path parameters merged into its query.
    pub location: Location,
    /// The configuration the matched route was registered with.
    pub config: RouteConfig,
}

/// A navigation listener.
pub type Listener = Receiver<Navigation>;

/// Matches redirects against the route table and drives listeners and views.
pub struct Dispatcher {
    table: RwLock<RouteTable>,
    listeners: Signal<Navigation>,
    reconciler: Reconciler,
    parser: UrlParser,
    generation: AtomicU64,
    isolate_listener_errors: bool,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.route_count())
            .field("listeners", &self.listeners.receiver_count())
            .field("reconciler", &self.reconciler)
            .field("isolate_listener_errors", &self.isolate_listener_errors)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default URL parser.
    pub fn new(resolver: Arc<dyn MountResolver>, settings: &RouterSettings) -> Self {
        Self::with_parser(resolver, url::default_parser(), settings)
    }

    /// Creates a dispatcher with a custom URL parser.
    pub fn with_parser(
        resolver: Arc<dyn MountResolver>,
        parser: UrlParser,
        settings: &RouterSettings,
    ) -> Self {
        Self {
            table: RwLock::new(RouteTable::with_default_target(
                settings.default_target.clone(),
            )),
            listeners: Signal::new(),
            reconciler: Reconciler::with_settings(resolver, settings),
            parser,
            generation: AtomicU64::new(0),
            isolate_listener_errors: settings.isolate_listener_errors,
        }
    }

    /// Registers a route. See [`RouteTable::add`].
    pub fn add(&self, config: RouteConfig) -> WaypostResult<RouteId> {
        self.table_mut().add(config)
    }

    /// Appends a listener.
    pub fn listen(&self, listener: Listener) {
        self.listeners.connect(listener);
    }

    /// Removes every registration of `listener`, returning how many were removed.
    pub fn unlisten(&self, listener: &Listener) -> usize {
        self.listeners.disconnect(listener)
    }

    /// Returns the number of listener registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners.receiver_count()
    }

    /// Returns the number of registered routes.
    pub fn route_count(&self) -> usize {
        self.table().len()
    }

    /// Returns the registered routes in priority order.
    pub fn routes(&self) -> Vec<Arc<RouteEntry>> {
        self.table().iter().cloned().collect()
    }

    /// Returns the view reconciler.
    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Runs the full pipeline for one redirect.
    ///
    /// # Errors
    ///
    /// Returns the first listener, handler, or view hook error. A listener
    /// error skips the remaining listeners and reconciliation, unless
    /// listener isolation is enabled, in which case listener errors are
    /// logged and dispatch continues.
    pub fn handle_location_change(&self, redirect: &Redirect) -> WaypostResult<()> {
        let span = dispatch_span(&redirect.url);
        let _guard = span.enter();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let parsed = (self.parser)(&redirect.url);

        let found = self.table().find(&parsed.path);
        let Some(route_match) = found else {
            debug!(path = %parsed.path, "no route matched; disposing mounted views");
            self.reconciler.dispose_all();
            return Ok(());
        };

        let mut location = Location::from(parsed);
        route_match.merge_params(&mut location.query);
        location.referrer.clone_from(&redirect.referrer);

        let entry = route_match.entry;
        debug!(route_id = %entry.id(), path = %location.path, "route matched");

        let navigation = Navigation {
            route_id: entry.id(),
            location,
            config: entry.config().clone(),
        };
        self.notify(&navigation)?;

        if self.superseded(generation) {
            debug!(route_id = %entry.id(), "navigation superseded by a listener");
            return Ok(());
        }

        self.reconciler.reconcile(&entry, &navigation.location)
    }

    fn notify(&self, navigation: &Navigation) -> WaypostResult<()> {
        if !self.isolate_listener_errors {
            return self.listeners.send(navigation);
        }

        for error in self.listeners.send_isolated(navigation) {
            warn!(
                route_id = %navigation.route_id,
                kind = error.kind(),
                error = %error,
                "listener failed; continuing"
            );
        }
        Ok(())
    }

    fn superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn table(&self) -> RwLockReadGuard<'_, RouteTable> {
        self.table.read().expect("route table lock poisoned")
    }

    fn table_mut(&self) -> RwLockWriteGuard<'_, RouteTable> {
        self.table.write().expect("route table lock poisoned")
    }
}
