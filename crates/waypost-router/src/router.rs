//! The public router facade.
//!
//! A [`Router`] ties one [`Dispatcher`] to one [`Locator`]. Starting the
//! router subscribes the dispatcher to the locator's redirects and replays
//! the current location; switching modes swaps the locator for a new one
//! built by the configured [`LocatorFactory`], restarting it if the router
//! was running.
//!
//! ```
//! use waypost_router::{Mode, Router};
//!
//! let mut router = Router::new();
//! assert_eq!(router.mode(), Mode::Hash);
//! router.set_mode_str("HTML5").unwrap();
//! assert_eq!(router.mode(), Mode::Html5);
//! assert!(router.set_mode_str("history").is_err());
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use waypost_core::settings::Mode;
use waypost_core::{RouterSettings, WaypostResult};

use crate::dispatcher::{Dispatcher, Listener};
use crate::locator::{memory_locator_factory, History, Locator, LocatorFactory, RedirectHandler};
use crate::location::Redirect;
use crate::table::{RouteConfig, RouteEntry, RouteId};
use crate::url::UrlParser;
use crate::view::{MountResolver, NullMountResolver};

/// Configures and builds a [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    settings: RouterSettings,
    mode: Option<Mode>,
    locator_factory: Option<LocatorFactory>,
    mount_resolver: Option<Arc<dyn MountResolver>>,
    url_parser: Option<UrlParser>,
}

impl RouterBuilder {
    /// Uses `settings` for the mode, default target, and view keys.
    #[must_use]
    pub fn settings(mut self, settings: RouterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Overrides the initial mode from the settings.
    #[must_use]
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the factory used to build a locator for each mode.
    ///
    /// Defaults to in-memory locators over a history positioned at `/`.
    #[must_use]
    pub fn locator_factory(mut self, factory: LocatorFactory) -> Self {
        self.locator_factory = Some(factory);
        self
    }

    /// Sets the resolver for view mount points.
    ///
    /// Defaults to [`NullMountResolver`].
    #[must_use]
    pub fn mount_resolver(mut self, resolver: Arc<dyn MountResolver>) -> Self {
        self.mount_resolver = Some(resolver);
        self
    }

    /// Replaces the raw URL parser.
    #[must_use]
    pub fn url_parser(mut self, parser: UrlParser) -> Self {
        self.url_parser = Some(parser);
        self
    }

    /// Builds a stopped router.
    pub fn build(self) -> Router {
        let mode = self.mode.unwrap_or(self.settings.mode);
        let locator_factory = self
            .locator_factory
            .unwrap_or_else(|| memory_locator_factory(History::new("/")));
        let resolver = self
            .mount_resolver
            .unwrap_or_else(|| Arc::new(NullMountResolver));

        let dispatcher = Arc::new(match self.url_parser {
            Some(parser) => Dispatcher::with_parser(resolver, parser, &self.settings),
            None => Dispatcher::new(resolver, &self.settings),
        });

        let target = Arc::clone(&dispatcher);
        let redirect_handler: RedirectHandler =
            Arc::new(move |redirect: &Redirect| target.handle_location_change(redirect));

        let locator = locator_factory(mode);
        debug!(%mode, "router built");

        Router {
            settings: self.settings,
            mode,
            locator,
            locator_factory,
            dispatcher,
            redirect_handler,
            started: false,
        }
    }
}

/// A client-side router.
pub struct Router {
    settings: RouterSettings,
    mode: Mode,
    locator: Arc<dyn Locator>,
    locator_factory: LocatorFactory,
    dispatcher: Arc<Dispatcher>,
    redirect_handler: RedirectHandler,
    started: bool,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("mode", &self.mode)
            .field("started", &self.started)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a stopped hash-mode router with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Registers a route.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`](waypost_core::WaypostError::ConfigurationError)
    /// if the rule's pattern text is not a valid regular expression.
    pub fn add(&mut self, config: RouteConfig) -> WaypostResult<&mut Self> {
        self.dispatcher.add(config)?;
        Ok(self)
    }

    /// Registers a route and returns its id.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn add_route(&mut self, config: RouteConfig) -> WaypostResult<RouteId> {
        self.dispatcher.add(config)
    }

    /// Appends a listener. The same listener may be added more than once.
    pub fn listen(&mut self, listener: Listener) -> &mut Self {
        self.dispatcher.listen(listener);
        self
    }

    /// Removes every registration of `listener`, returning how many were removed.
    pub fn unlisten(&mut self, listener: &Listener) -> usize {
        self.dispatcher.unlisten(listener)
    }

    /// Starts routing. Does nothing if already started.
    ///
    /// # Errors
    ///
    /// Returns any error raised while routing the current location. The
    /// router stays started.
    pub fn start(&mut self) -> WaypostResult<&mut Self> {
        if self.started {
            return Ok(self);
        }

        self.started = true;
        info!(mode = %self.mode, "router started");
        self.locator.on_redirect(Arc::clone(&self.redirect_handler));
        self.locator.start();
        self.locator.reload()?;
        Ok(self)
    }

    /// Stops routing. Mounted views stay mounted.
    pub fn stop(&mut self) -> &mut Self {
        self.locator.un_redirect(&self.redirect_handler);
        self.locator.stop();
        if self.started {
            info!(mode = %self.mode, "router stopped");
        }
        self.started = false;
        self
    }

    /// Switches to `mode`, replacing the locator.
    ///
    /// Switching to the current mode does nothing. A started router is
    /// stopped, switched, and started again, which replays the current
    /// location as read by the new mode.
    ///
    /// # Errors
    ///
    /// Returns any error raised while routing the replayed location.
    pub fn set_mode(&mut self, mode: Mode) -> WaypostResult<&mut Self> {
        if self.mode == mode {
            return Ok(self);
        }

        let restart = self.started;
        if restart {
            self.stop();
        }

        info!(from = %self.mode, to = %mode, "switching mode");
        self.mode = mode;
        self.locator = (self.locator_factory)(mode);

        if restart {
            self.start()?;
        }
        Ok(self)
    }

    /// Parses `mode` case-insensitively and switches to it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`](waypost_core::WaypostError::ConfigurationError)
    /// for an unknown mode, or any error from [`set_mode`](Self::set_mode).
    pub fn set_mode_str(&mut self, mode: &str) -> WaypostResult<&mut Self> {
        self.set_mode(mode.parse()?)
    }

    /// Asks the locator to move to `url`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while routing the new location.
    pub fn navigate(&self, url: &str) -> WaypostResult<()> {
        self.locator.redirect(url)
    }

    /// Returns the active mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns `true` while the router is started.
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Returns the settings the router was built with.
    pub const fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Returns the active locator.
    pub fn locator(&self) -> &Arc<dyn Locator> {
        &self.locator
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Returns the registered routes in priority order.
    pub fn routes(&self) -> Vec<Arc<RouteEntry>> {
        self.dispatcher.routes()
    }

    /// Returns the routes that currently have a mounted view.
    pub fn mounted_route_ids(&self) -> Vec<RouteId> {
        self.dispatcher.reconciler().mounted_route_ids()
    }

    /// Returns the number of listener registrations.
    pub fn listener_count(&self) -> usize {
        self.dispatcher.listener_count()
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.dispatcher.route_count()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        if self.started {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use waypost_core::WaypostError;

    fn router_over(history: &Arc<History>) -> Router {
        Router::builder()
            .locator_factory(memory_locator_factory(Arc::clone(history)))
            .build()
    }

    fn recording_handler(
        seen: &Arc<Mutex<Vec<String>>>,
    ) -> impl Fn(&crate::Location) -> WaypostResult<()> + Send + Sync + 'static {
        let seen = Arc::clone(seen);
        move |location: &crate::Location| {
            seen.lock().unwrap().push(location.path.clone());
            Ok(())
        }
    }

    #[test]
    fn test_defaults() {
        let router = Router::new();
        assert_eq!(router.mode(), Mode::Hash);
        assert!(!router.is_started());
        assert!(router.is_empty());
        assert_eq!(router.listener_count(), 0);
    }

    #[test]
    fn test_builder_mode_overrides_settings() {
        let router = Router::builder().mode(Mode::Html5).build();
        assert_eq!(router.mode(), Mode::Html5);

        let settings = RouterSettings {
            mode: Mode::Html5,
            ..RouterSettings::default()
        };
        assert_eq!(Router::builder().settings(settings).build().mode(), Mode::Html5);
    }

    #[test]
    fn test_start_routes_current_location() {
        let history = History::new("/#/a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = router_over(&history);
        router
            .add(RouteConfig::new("/a").handler(recording_handler(&seen)))
            .unwrap();

        router.start().unwrap();
        assert!(router.is_started());
        assert_eq!(*seen.lock().unwrap(), vec!["/a"]);
    }

    #[test]
    fn test_start_is_idempotent() {
        let history = History::new("/#/a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = router_over(&history);
        router
            .add(RouteConfig::new("/a").handler(recording_handler(&seen)))
            .unwrap();

        router.start().unwrap();
        router.start().unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stop_ignores_changes() {
        let history = History::new("/#/a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = router_over(&history);
        router
            .add(RouteConfig::new("/:page").handler(recording_handler(&seen)))
            .unwrap();

        router.start().unwrap();
        router.stop();
        router.navigate("/b").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["/a"]);
        assert_eq!(history.href(), "/#/b");
    }

    #[test]
    fn test_set_mode_same_mode_is_noop() {
        let history = History::new("/#/a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = router_over(&history);
        router
            .add(RouteConfig::new("/a").handler(recording_handler(&seen)))
            .unwrap();
        router.start().unwrap();
        let before = Arc::clone(router.locator());

        router.set_mode(Mode::Hash).unwrap();
        router.set_mode_str("HASH").unwrap();
        assert!(Arc::ptr_eq(&before, router.locator()));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_set_mode_restarts_and_replays() {
        let history = History::new("/docs#/a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = router_over(&history);
        router
            .add(RouteConfig::new("/:page").handler(recording_handler(&seen)))
            .unwrap();
        router.start().unwrap();

        router.set_mode(Mode::Html5).unwrap();
        assert!(router.is_started());
        assert_eq!(router.mode(), Mode::Html5);
        assert_eq!(*seen.lock().unwrap(), vec!["/a", "/docs"]);
    }

    #[test]
    fn test_set_mode_while_stopped_does_not_start() {
        let mut router = Router::new();
        router.set_mode(Mode::Html5).unwrap();
        assert!(!router.is_started());
    }

    #[test]
    fn test_set_mode_str_unknown_is_error() {
        let mut router = Router::new();
        let err = router.set_mode_str("memory").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(router.mode(), Mode::Hash);
    }

    #[test]
    fn test_add_invalid_pattern_is_error() {
        let mut router = Router::new();
        let err = router.add(RouteConfig::new("/(unclosed")).unwrap_err();
        assert!(matches!(err, WaypostError::ConfigurationError(_)));
        assert!(router.is_empty());
    }

    #[test]
    fn test_add_route_returns_increasing_ids() {
        let mut router = Router::new();
        let a = router.add_route(RouteConfig::new("/a")).unwrap();
        let b = router.add_route(RouteConfig::new("/b")).unwrap();
        assert!(b > a);
        assert_eq!(router.len(), 2);
        assert_eq!(router.routes()[0].id(), a);
    }

    #[test]
    fn test_drop_stops_locator() {
        let history = History::new("/#/a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let mut router = router_over(&history);
            router
                .add(RouteConfig::new("/:page").handler(recording_handler(&seen)))
                .unwrap();
            router.start().unwrap();
        }
        history.navigate("/#/b").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["/a"]);
    }
}
