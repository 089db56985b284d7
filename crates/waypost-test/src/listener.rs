//! Capturing navigation listeners.

use std::sync::{Arc, Mutex, MutexGuard};

use waypost_router::{Listener, Location, Navigation, RouteId};

/// Records every [`Navigation`] delivered to its listener.
///
/// Cloning a log shares the underlying record.
#[derive(Debug, Clone, Default)]
pub struct ListenerLog {
    seen: Arc<Mutex<Vec<Navigation>>>,
}

impl ListenerLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a listener that records into this log.
    ///
    /// Each call builds a distinct listener; keep the returned value to
    /// unregister it later.
    pub fn listener(&self) -> Listener {
        let seen = Arc::clone(&self.seen);
        Arc::new(move |navigation: &Navigation| {
            seen.lock()
                .expect("ListenerLog lock poisoned")
                .push(navigation.clone());
            Ok(())
        })
    }

    /// Returns a copy of every recorded navigation, oldest first.
    pub fn navigations(&self) -> Vec<Navigation> {
        self.lock().clone()
    }

    /// Returns the matched route of every recorded navigation.
    pub fn route_ids(&self) -> Vec<RouteId> {
        self.lock().iter().map(|n| n.route_id).collect()
    }

    /// Returns the location of every recorded navigation.
    pub fn locations(&self) -> Vec<Location> {
        self.lock().iter().map(|n| n.location.clone()).collect()
    }

    /// Returns the most recent navigation.
    pub fn last(&self) -> Option<Navigation> {
        self.lock().last().cloned()
    }

    /// Returns the number of recorded navigations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Navigation>> {
        self.seen.lock().expect("ListenerLog lock poisoned")
    }
}
