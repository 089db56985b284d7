//! View and mount-point capabilities.
//!
//! The reconciler never talks to a UI framework directly. A route's view
//! factory builds a [`View`], and a [`MountResolver`] turns a route's target
//! identifier into a [`MountPoint`] the view can attach to.

use std::collections::HashMap;
use std::sync::Arc;

use waypost_core::WaypostResult;

use crate::location::Location;

/// A view instance managed by the reconciler.
pub trait View: Send {
    /// Stores the current location under `key` in the view's data.
    fn set_data(&mut self, key: &str, location: &Location);

    /// Invokes the named lifecycle hook.
    fn invoke_hook(&mut self, hook: &str) -> WaypostResult<()>;

    /// Attaches the view to a resolved mount point.
    fn attach(&mut self, mount_point: &MountPoint);

    /// Tears the view down, releasing everything it holds.
    fn dispose(&mut self);
}

/// Builds a fresh view instance for a route.
pub type ViewFactory = Arc<dyn Fn() -> Box<dyn View> + Send + Sync>;

/// A resolved, attachable place in the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPoint {
    target: String,
    node: usize,
}

impl MountPoint {
    /// Creates a mount point for `target` backed by host node `node`.
    pub fn new(target: impl Into<String>, node: usize) -> Self {
        Self {
            target: target.into(),
            node,
        }
    }

    /// Returns the identifier this mount point was resolved from.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the host node handle.
    pub const fn node(&self) -> usize {
        self.node
    }
}

/// Resolves route target identifiers to mount points.
///
/// Returning `None` is not an error: the view is still built and tracked,
/// just not attached.
pub trait MountResolver: Send + Sync {
    /// Looks up `target` in the host environment.
    fn resolve(&self, target: &str) -> Option<MountPoint>;
}

/// A resolver over a fixed set of targets, numbered in registration order.
///
/// # Examples
///
/// ```
/// use waypost_router::view::{MountResolver, StaticMountResolver};
///
/// let resolver = StaticMountResolver::new(["#main", "#sidebar"]);
/// assert_eq!(resolver.resolve("#sidebar").unwrap().node(), 1);
/// assert!(resolver.resolve("#footer").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticMountResolver {
    nodes: HashMap<String, usize>,
}

impl StaticMountResolver {
    /// Creates a resolver that knows the given targets.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut resolver = Self::default();
        for target in targets {
            resolver.insert(target);
        }
        resolver
    }

    /// Adds a target. Adding a known target keeps its node.
    pub fn insert(&mut self, target: impl Into<String>) -> usize {
        let next = self.nodes.len();
        *self.nodes.entry(target.into()).or_insert(next)
    }
}

impl MountResolver for StaticMountResolver {
    fn resolve(&self, target: &str) -> Option<MountPoint> {
        self.nodes
            .get(target)
            .map(|&node| MountPoint::new(target, node))
    }
}

/// A resolver that never finds anything; views stay unattached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMountResolver;

impl MountResolver for NullMountResolver {
    fn resolve(&self, _target: &str) -> Option<MountPoint> {
        None
    }
}
