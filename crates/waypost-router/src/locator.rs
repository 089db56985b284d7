//! Location observation.
//!
//! A [`Locator`] watches the host's notion of "current location" and emits a
//! [`Redirect`] whenever it changes. The router owns exactly one locator at a
//! time, built for the active [`Mode`] by a [`LocatorFactory`].
//!
//! [`MemoryLocator`] is a headless locator over a shared [`History`]. It is
//! what the router uses when no other factory is configured, and it is how
//! tests drive navigation without a browser.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, trace};

use waypost_core::settings::Mode;
use waypost_core::WaypostResult;
use waypost_signals::{Receiver, Signal};

use crate::location::Redirect;

/// A subscriber to a locator's redirects.
pub type RedirectHandler = Receiver<Redirect>;

/// Builds a locator for a mode.
pub type LocatorFactory = Arc<dyn Fn(Mode) -> Arc<dyn Locator> + Send + Sync>;

/// Observes and changes the current location.
pub trait Locator: Send + Sync {
    /// Subscribes `handler` to redirects.
    fn on_redirect(&self, handler: RedirectHandler);

    /// Unsubscribes every registration of `handler`, returning how many were removed.
    fn un_redirect(&self, handler: &RedirectHandler) -> usize;

    /// Begins observing location changes.
    fn start(&self);

    /// Stops observing location changes.
    fn stop(&self);

    /// Re-emits the current location to subscribers.
    ///
    /// # Errors
    ///
    /// Returns the first error a subscriber reports.
    fn reload(&self) -> WaypostResult<()>;

    /// Changes the current location to `url`.
    ///
    /// # Errors
    ///
    /// Returns the first error a subscriber reports while handling the
    /// resulting redirect.
    fn redirect(&self, url: &str) -> WaypostResult<()>;
}

/// A change of the full href held by a [`History`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefChange {
    /// The href before the navigation.
    pub from: String,
    /// The href the history now holds.
    pub to: String,
}

/// An in-memory stand-in for the host's address bar.
///
/// Several locators (one per mode) may observe the same history, which is
/// how a mode switch keeps the current address.
pub struct History {
    href: Mutex<String>,
    changed: Signal<HrefChange>,
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("href", &*self.lock())
            .field("observers", &self.changed.receiver_count())
            .finish()
    }
}

impl History {
    /// Creates a history positioned at `href`.
    pub fn new(href: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            href: Mutex::new(href.into()),
            changed: Signal::new(),
        })
    }

    /// Returns the current href.
    pub fn href(&self) -> String {
        self.lock().clone()
    }

    /// Moves to `href`, notifying observers if it differs from the current one.
    ///
    /// # Errors
    ///
    /// Returns the first error an observer reports.
    pub fn navigate(&self, href: impl Into<String>) -> WaypostResult<()> {
        let to = href.into();
        let from = {
            let mut current = self.lock();
            if *current == to {
                return Ok(());
            }
            std::mem::replace(&mut *current, to.clone())
        };

        trace!(%from, %to, "history changed");
        self.changed.send(&HrefChange { from, to })
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.href.lock().expect("history lock poisoned")
    }
}

/// Reads the routable URL out of an href for `mode`.
///
/// In hash mode the URL is the fragment; in HTML5 mode it is everything
/// before the fragment. An empty result reads as `/`.
///
/// # Examples
///
/// ```
/// use waypost_router::locator::url_for_mode;
/// use waypost_router::Mode;
///
/// assert_eq!(url_for_mode("/app#/user/1", Mode::Hash), "/user/1");
/// assert_eq!(url_for_mode("/app#/user/1", Mode::Html5), "/app");
/// assert_eq!(url_for_mode("/app", Mode::Hash), "/");
/// ```
pub fn url_for_mode(href: &str, mode: Mode) -> String {
    let (before, fragment) = href.split_once('#').unwrap_or((href, ""));
    let url = match mode {
        Mode::Hash => fragment,
        Mode::Html5 => before,
    };
    if url.is_empty() {
        "/".to_string()
    } else {
        url.to_string()
    }
}

fn href_for_mode(current: &str, url: &str, mode: Mode) -> String {
    match mode {
        Mode::Hash => {
            let base = current.split_once('#').map_or(current, |(before, _)| before);
            format!("{base}#{url}")
        }
        Mode::Html5 => url.to_string(),
    }
}

/// A locator over a shared [`History`].
pub struct MemoryLocator {
    mode: Mode,
    history: Arc<History>,
    redirects: Signal<Redirect>,
    observer: Receiver<HrefChange>,
    running: AtomicBool,
}

impl std::fmt::Debug for MemoryLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLocator")
            .field("mode", &self.mode)
            .field("running", &self.is_running())
            .field("subscribers", &self.redirects.receiver_count())
            .finish_non_exhaustive()
    }
}

impl MemoryLocator {
    /// Creates a stopped locator for `mode` over `history`.
    pub fn new(mode: Mode, history: Arc<History>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let this = Weak::clone(this);
            let observer: Receiver<HrefChange> = Arc::new(move |change: &HrefChange| {
                this.upgrade()
                    .map_or(Ok(()), |locator| locator.on_href_change(change))
            });
            Self {
                mode,
                history,
                redirects: Signal::new(),
                observer,
                running: AtomicBool::new(false),
            }
        })
    }

    /// Returns the mode this locator reads URLs for.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the observed history.
    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    /// Returns the current URL as read for this locator's mode.
    pub fn current_url(&self) -> String {
        url_for_mode(&self.history.href(), self.mode)
    }

    /// Returns `true` between [`start`](Locator::start) and [`stop`](Locator::stop).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn on_href_change(&self, change: &HrefChange) -> WaypostResult<()> {
        let from = url_for_mode(&change.from, self.mode);
        let to = url_for_mode(&change.to, self.mode);
        if from == to {
            return Ok(());
        }
        self.redirects
            .send(&Redirect::new(to).with_referrer(from))
    }
}

impl Locator for MemoryLocator {
    fn on_redirect(&self, handler: RedirectHandler) {
        self.redirects.connect(handler);
    }

    fn un_redirect(&self, handler: &RedirectHandler) -> usize {
        self.redirects.disconnect(handler)
    }

    fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(mode = %self.mode, "memory locator started");
        self.history.changed.connect(Arc::clone(&self.observer));
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        debug!(mode = %self.mode, "memory locator stopped");
        self.history.changed.disconnect(&self.observer);
    }

    fn reload(&self) -> WaypostResult<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.redirects.send(&Redirect::new(self.current_url()))
    }

    fn redirect(&self, url: &str) -> WaypostResult<()> {
        let href = href_for_mode(&self.history.href(), url, self.mode);
        self.history.navigate(href)
    }
}

/// Returns a factory that builds [`MemoryLocator`]s over `history`.
pub fn memory_locator_factory(history: Arc<History>) -> LocatorFactory {
    Arc::new(move |mode| -> Arc<dyn Locator> {
        MemoryLocator::new(mode, Arc::clone(&history))
    })
}
