//! Mounted-view reconciliation.
//!
//! The [`Reconciler`] owns the registry of mounted views. For each matched
//! location it disposes every view mounted for another route, updates the
//! view already mounted for the matched route, and builds a view (or runs
//! the route handler) when nothing was mounted for the route yet. After a
//! reconcile the registry holds at most one view, belonging to the matched
//! route.
//!
//! The registry lock is never held while view hooks, handlers, or dispose
//! run, so those callbacks may navigate again. A view whose hook is running
//! stays registered but is checked out of its slot:
//!
//! - a nested reconcile for the same route parks its location in the slot,
//!   and the running update applies it once the hook returns;
//! - a nested reconcile for another route (or [`Reconciler::dispose_all`])
//!   drops the slot, and the running update disposes the view once the hook
//!   returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use waypost_core::{RouterSettings, WaypostResult};

use crate::location::Location;
use crate::table::{RouteEntry, RouteId};
use crate::view::{MountResolver, View, ViewFactory};

/// A registry slot for a view mounted for a route.
pub struct MountedView {
    key: u64,
    route_id: RouteId,
    /// `None` while the view is checked out for a hook.
    view: Option<Box<dyn View>>,
    /// A newer location delivered while the view was checked out.
    pending: Option<Location>,
}

impl MountedView {
    /// Returns the route this view belongs to.
    pub const fn route_id(&self) -> RouteId {
        self.route_id
    }

    /// Returns `true` while one of the view's hooks is running.
    pub const fn is_busy(&self) -> bool {
        self.view.is_none()
    }
}

impl std::fmt::Debug for MountedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedView")
            .field("route_id", &self.route_id)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

/// What a reconcile found for the matched route once the registry was swept.
enum Plan {
    /// The route's view is busy in an outer call; the location was parked.
    Deferred,
    /// The route's view was checked out for an update.
    Update(u64, Box<dyn View>),
    /// A slot was reserved for a view the factory has yet to build.
    Create(u64, ViewFactory),
    /// The route has no view factory.
    Handle,
}

/// Tracks mounted views and decides create / update / dispose per location.
pub struct Reconciler {
    mounted: Mutex<Vec<MountedView>>,
    next_key: AtomicU64,
    epoch: AtomicU64,
    resolver: Arc<dyn MountResolver>,
    data_key: String,
    route_hook: String,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("mounted", &self.mounted_route_ids())
            .field("data_key", &self.data_key)
            .field("route_hook", &self.route_hook)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler using the `"route"` data key and hook.
    pub fn new(resolver: Arc<dyn MountResolver>) -> Self {
        Self::with_settings(resolver, &RouterSettings::default())
    }

    /// Creates a reconciler with the data key and hook name from `settings`.
    pub fn with_settings(resolver: Arc<dyn MountResolver>, settings: &RouterSettings) -> Self {
        Self {
            mounted: Mutex::new(Vec::new()),
            next_key: AtomicU64::new(1),
            epoch: AtomicU64::new(0),
            resolver,
            data_key: settings.data_key.clone(),
            route_hook: settings.route_hook.clone(),
        }
    }

    /// Reconciles the mounted views against a matched route.
    ///
    /// Views of other routes are disposed before any hook runs.
    ///
    /// # Errors
    ///
    /// Returns the first hook or handler error. A view whose update hook
    /// failed stays mounted, and a new view whose first hook failed is
    /// disposed without being registered.
    pub fn reconcile(&self, entry: &RouteEntry, location: &Location) -> WaypostResult<()> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let (plan, stale) = self.sweep(entry, location);

        for mut view in stale {
            view.dispose();
        }

        match plan {
            Plan::Deferred => {
                debug!(route_id = %entry.id(), "view busy; update deferred");
                Ok(())
            }
            Plan::Update(key, view) => {
                debug!(route_id = %entry.id(), "updating view");
                self.drive(key, view, location, None)
            }
            Plan::Create(key, factory) => {
                if !self.holds(key) {
                    debug!(route_id = %entry.id(), "navigation superseded before view creation");
                    return Ok(());
                }
                debug!(route_id = %entry.id(), target = %entry.target(), "creating view");
                self.drive(key, factory(), location, Some(entry))
            }
            Plan::Handle => {
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    debug!(route_id = %entry.id(), "navigation superseded; handler skipped");
                    return Ok(());
                }
                if let Some(handler) = entry.handler() {
                    debug!(route_id = %entry.id(), "running route handler");
                    handler(location)?;
                } else {
                    debug!(route_id = %entry.id(), "route has neither view nor handler");
                }
                Ok(())
            }
        }
    }

    /// Disposes every mounted view and empties the registry.
    ///
    /// A view whose hook is running is disposed by its caller once the hook
    /// returns.
    pub fn dispose_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let previous = std::mem::take(&mut *self.lock());
        for mounted in previous {
            if let Some(mut view) = mounted.view {
                debug!(route_id = %mounted.route_id, "disposing view");
                view.dispose();
            }
        }
    }

    /// Returns the routes that currently have a mounted view.
    pub fn mounted_route_ids(&self) -> Vec<RouteId> {
        self.lock().iter().map(MountedView::route_id).collect()
    }

    /// Returns the number of mounted views.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no view is mounted.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes other routes' slots and decides what to do for `entry`,
    /// returning the plan and the views to dispose.
    fn sweep(&self, entry: &RouteEntry, location: &Location) -> (Plan, Vec<Box<dyn View>>) {
        let mut mounted = self.lock();
        let mut stale = Vec::new();
        let mut kept: Option<MountedView> = None;

        for slot in std::mem::take(&mut *mounted) {
            if slot.route_id == entry.id() && kept.is_none() {
                kept = Some(slot);
            } else if let Some(view) = slot.view {
                debug!(route_id = %slot.route_id, "disposing view");
                stale.push(view);
            }
        }

        let plan = match kept {
            Some(mut slot) => {
                let plan = match slot.view.take() {
                    Some(view) => Plan::Update(slot.key, view),
                    None => {
                        slot.pending = Some(location.clone());
                        Plan::Deferred
                    }
                };
                mounted.push(slot);
                plan
            }
            None => match entry.view_factory() {
                Some(factory) => {
                    let key = self.next_key.fetch_add(1, Ordering::SeqCst);
                    mounted.push(MountedView {
                        key,
                        route_id: entry.id(),
                        view: None,
                        pending: None,
                    });
                    Plan::Create(key, Arc::clone(factory))
                }
                None => Plan::Handle,
            },
        };

        (plan, stale)
    }

    /// Runs the data/hook cycle on a checked-out view until no newer location
    /// is parked, then checks it back in. `fresh` is the entry of a view the
    /// factory just built; it is attached after its first successful hook,
    /// unless a nested navigation already dropped its slot.
    fn drive(
        &self,
        key: u64,
        mut view: Box<dyn View>,
        location: &Location,
        mut fresh: Option<&RouteEntry>,
    ) -> WaypostResult<()> {
        let is_new = fresh.is_some();
        let mut current = location.clone();

        loop {
            view.set_data(&self.data_key, &current);
            let result = view.invoke_hook(&self.route_hook);
            if result.is_ok() {
                if let Some(entry) = fresh.take().filter(|_| self.holds(key)) {
                    self.attach(entry, view.as_mut());
                }
            }

            let mut mounted = self.lock();
            let Some(index) = mounted.iter().position(|slot| slot.key == key) else {
                drop(mounted);
                debug!("view superseded while its hook ran; disposing");
                view.dispose();
                return result;
            };

            if let Err(e) = result {
                if is_new {
                    mounted.remove(index);
                    drop(mounted);
                    view.dispose();
                } else {
                    let slot = &mut mounted[index];
                    slot.pending = None;
                    slot.view = Some(view);
                }
                return Err(e);
            }

            let slot = &mut mounted[index];
            match slot.pending.take() {
                Some(next) => current = next,
                None => {
                    slot.view = Some(view);
                    return Ok(());
                }
            }
        }
    }

    fn attach(&self, entry: &RouteEntry, view: &mut dyn View) {
        match self.resolver.resolve(entry.target()) {
            Some(mount_point) => view.attach(&mount_point),
            None => warn!(
                route_id = %entry.id(),
                target = %entry.target(),
                "mount point not found; view left unattached"
            ),
        }
    }

    fn holds(&self, key: u64) -> bool {
        self.lock().iter().any(|slot| slot.key == key)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MountedView>> {
        self.mounted.lock().expect("mounted view lock poisoned")
    }
}
