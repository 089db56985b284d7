//! A locator driven by hand.
//!
//! [`ScriptedLocator`] never observes anything on its own. Tests call
//! [`emit`](ScriptedLocator::emit) to simulate the host reporting a new
//! location, and read the call counters to assert how the router drove it.
//! [`ScriptedLocators`] is a factory that keeps every locator it built, one
//! per mode switch.
//!
//! ## Example
//!
//! ```
//! use waypost_router::{RouteConfig, Router};
//! use waypost_test::locator::ScriptedLocators;
//!
//! let locators = ScriptedLocators::new("/home");
//! let mut router = Router::builder().locator_factory(locators.factory()).build();
//! router.add(RouteConfig::new("/home")).unwrap();
//! router.start().unwrap();
//!
//! let locator = locators.current().unwrap();
//! assert_eq!(locator.start_count(), 1);
//! assert_eq!(locator.reload_count(), 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use waypost_core::settings::Mode;
use waypost_core::WaypostResult;
use waypost_router::locator::{Locator, LocatorFactory, RedirectHandler};
use waypost_router::Redirect;
use waypost_signals::Signal;

/// A locator whose location changes only when a test says so.
pub struct ScriptedLocator {
    mode: Mode,
    url: Mutex<String>,
    handlers: Signal<Redirect>,
    running: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    reloads: AtomicUsize,
}

impl std::fmt::Debug for ScriptedLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedLocator")
            .field("mode", &self.mode)
            .field("url", &self.url())
            .field("running", &self.is_running())
            .field("handlers", &self.handler_count())
            .finish_non_exhaustive()
    }
}

impl ScriptedLocator {
    /// Creates a stopped locator positioned at `url`.
    pub fn new(mode: Mode, url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            mode,
            url: Mutex::new(url.into()),
            handlers: Signal::new(),
            running: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            reloads: AtomicUsize::new(0),
        })
    }

    /// Simulates the host moving to `url`. The previous URL becomes the referrer.
    ///
    /// Nothing is emitted while the locator is stopped, but the URL still moves.
    ///
    /// # Errors
    ///
    /// Returns the first error a subscriber reports.
    pub fn emit(&self, url: &str) -> WaypostResult<()> {
        let previous = std::mem::replace(&mut *self.lock_url(), url.to_string());
        if !self.is_running() {
            return Ok(());
        }
        self.handlers
            .send(&Redirect::new(url).with_referrer(previous))
    }

    /// Returns the mode this locator was built for.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the current URL.
    pub fn url(&self) -> String {
        self.lock_url().clone()
    }

    /// Returns `true` between start and stop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns the number of subscribed redirect handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.receiver_count()
    }

    /// Returns how many times `start` was called.
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Returns how many times `stop` was called.
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Returns how many times `reload` was called.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    fn lock_url(&self) -> MutexGuard<'_, String> {
        self.url.lock().expect("ScriptedLocator lock poisoned")
    }
}

impl Locator for ScriptedLocator {
    fn on_redirect(&self, handler: RedirectHandler) {
        self.handlers.connect(handler);
    }

    fn un_redirect(&self, handler: &RedirectHandler) -> usize {
        self.handlers.disconnect(handler)
    }

    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    fn reload(&self) -> WaypostResult<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if !self.is_running() {
            return Ok(());
        }
        self.handlers.send(&Redirect::new(self.url()))
    }

    fn redirect(&self, url: &str) -> WaypostResult<()> {
        self.emit(url)
    }
}

/// A locator factory that remembers every [`ScriptedLocator`] it built.
///
/// Each new locator starts at the URL the previous one ended on, so a mode
/// switch replays the current location.
#[derive(Debug, Clone)]
pub struct ScriptedLocators {
    initial_url: String,
    built: Arc<Mutex<Vec<Arc<ScriptedLocator>>>>,
}

impl ScriptedLocators {
    /// Creates a factory whose first locator starts at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            initial_url: url.into(),
            built: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a [`LocatorFactory`] to hand to the router builder.
    pub fn factory(&self) -> LocatorFactory {
        let this = self.clone();
        Arc::new(move |mode| -> Arc<dyn Locator> { this.build(mode) })
    }

    /// Returns every locator built so far, oldest first.
    pub fn built(&self) -> Vec<Arc<ScriptedLocator>> {
        self.lock().clone()
    }

    /// Returns the most recently built locator.
    pub fn current(&self) -> Option<Arc<ScriptedLocator>> {
        self.lock().last().cloned()
    }

    /// Returns the modes locators were built for, in order.
    pub fn modes(&self) -> Vec<Mode> {
        self.lock().iter().map(|locator| locator.mode()).collect()
    }

    fn build(&self, mode: Mode) -> Arc<ScriptedLocator> {
        let mut built = self.lock();
        let url = built
            .last()
            .map_or_else(|| self.initial_url.clone(), |previous| previous.url());
        let locator = ScriptedLocator::new(mode, url);
        built.push(Arc::clone(&locator));
        locator
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<ScriptedLocator>>> {
        self.built.lock().expect("ScriptedLocators lock poisoned")
    }
}
