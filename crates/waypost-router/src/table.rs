//! The route table.
//!
//! A [`RouteTable`] is an insertion-ordered list of [`RouteEntry`] values.
//! Insertion order is priority order: [`RouteTable::find`] returns the first
//! entry whose matcher accepts the path, so callers register routes from
//! most specific to most general. Overlapping and duplicate rules are legal.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use waypost_core::WaypostResult;

use crate::location::Location;
use crate::pattern::{self, Matcher, Rule};
use crate::view::{View, ViewFactory};

/// The type for route handler callbacks.
///
/// A handler runs for a matched route that has no view factory.
pub type Handler = Arc<dyn Fn(&Location) -> WaypostResult<()> + Send + Sync>;

/// The unique, monotonically assigned identifier of a route entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u64);

impl RouteId {
    /// Returns the raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The configuration of one route, as passed to `add`.
///
/// When both a view factory and a handler are set, the view factory wins.
/// When neither is set, a match still notifies listeners and disposes other
/// views, but does nothing else.
///
/// # Examples
///
/// ```
/// use waypost_router::RouteConfig;
///
/// let config = RouteConfig::new("/list/:category")
///     .target("#content")
///     .handler(|location| {
///         println!("showing {}", location.query["category"]);
///         Ok(())
///     });
/// assert_eq!(config.target.as_deref(), Some("#content"));
/// ```
#[derive(Clone)]
pub struct RouteConfig {
    /// The route rule.
    pub rule: Rule,
    /// Callback for routes without a view.
    pub handler: Option<Handler>,
    /// Mount-point identifier; the router's default target when unset.
    pub target: Option<String>,
    /// Builds the route's view.
    pub view_factory: Option<ViewFactory>,
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("rule", &self.rule)
            .field("has_handler", &self.handler.is_some())
            .field("target", &self.target)
            .field("has_view_factory", &self.view_factory.is_some())
            .finish()
    }
}

impl RouteConfig {
    /// Creates a configuration with only a rule.
    pub fn new(rule: impl Into<Rule>) -> Self {
        Self {
            rule: rule.into(),
            handler: None,
            target: None,
            view_factory: None,
        }
    }

    /// Sets the handler.
    #[must_use]
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Location) -> WaypostResult<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets the mount-point identifier.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the view factory.
    #[must_use]
    pub fn view<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn View> + Send + Sync + 'static,
    {
        self.view_factory = Some(Arc::new(factory));
        self
    }
}

/// A registered route. Entries are never mutated or removed.
pub struct RouteEntry {
    id: RouteId,
    matcher: Arc<dyn Matcher>,
    param_names: Vec<String>,
    target: String,
    config: RouteConfig,
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("id", &self.id)
            .field("matcher", &self.matcher)
            .field("param_names", &self.param_names)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl RouteEntry {
    /// Returns the entry's identifier.
    pub const fn id(&self) -> RouteId {
        self.id
    }

    /// Returns the compiled matcher.
    pub fn matcher(&self) -> &Arc<dyn Matcher> {
        &self.matcher
    }

    /// Returns the parameter names by capture index; index 0 is always empty.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Returns the resolved mount-point identifier.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the configuration the entry was registered with.
    pub const fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Returns the view factory, if any.
    pub const fn view_factory(&self) -> Option<&ViewFactory> {
        self.config.view_factory.as_ref()
    }

    /// Returns the handler, if any.
    pub const fn handler(&self) -> Option<&Handler> {
        self.config.handler.as_ref()
    }

    /// Returns the query key for capture `index` (1-based): the declared
    /// parameter name, or the index itself when the capture is unnamed.
    pub fn param_key(&self, index: usize) -> Cow<'_, str> {
        match self.param_names.get(index) {
            Some(name) if !name.is_empty() => Cow::Borrowed(name.as_str()),
            _ => Cow::Owned(index.to_string()),
        }
    }
}

/// The result of a successful [`RouteTable::find`].
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The first entry that accepted the path.
    pub entry: Arc<RouteEntry>,
    /// Captures 1..n; `None` for groups that did not participate.
    pub captures: Vec<Option<String>>,
}

impl RouteMatch {
    /// Writes the captured parameters into `query`.
    ///
    /// Capture `i` is stored under the entry's parameter name for `i`, or
    /// under `i` itself when unnamed. Non-participating groups are skipped.
    pub fn merge_params(&self, query: &mut HashMap<String, String>) {
        for (offset, capture) in self.captures.iter().enumerate() {
            if let Some(value) = capture {
                let key = self.entry.param_key(offset + 1);
                query.insert(key.into_owned(), value.clone());
            }
        }
    }
}

/// The insertion-ordered route table.
pub struct RouteTable {
    entries: Vec<Arc<RouteEntry>>,
    next_id: u64,
    default_target: String,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries)
            .field("default_target", &self.default_target)
            .finish_non_exhaustive()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Creates an empty table whose default target is `#main`.
    pub fn new() -> Self {
        Self::with_default_target("#main")
    }

    /// Creates an empty table with the given default target.
    pub fn with_default_target(default_target: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            default_target: default_target.into(),
        }
    }

    /// Compiles and appends a route, returning its new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WaypostError::ConfigurationError`](waypost_core::WaypostError::ConfigurationError)
    /// if the rule does not compile; the table is left unchanged.
    pub fn add(&mut self, config: RouteConfig) -> WaypostResult<RouteId> {
        let compiled = pattern::compile(&config.rule)?;

        let id = RouteId(self.next_id);
        self.next_id += 1;

        let target = config
            .target
            .clone()
            .unwrap_or_else(|| self.default_target.clone());

        tracing::debug!(route_id = %id, rule = ?config.rule, target = %target, "route added");

        self.entries.push(Arc::new(RouteEntry {
            id,
            matcher: compiled.matcher,
            param_names: compiled.param_names,
            target,
            config,
        }));

        Ok(id)
    }

    /// Returns the first entry, in insertion order, that matches `path`.
    pub fn find(&self, path: &str) -> Option<RouteMatch> {
        self.entries.iter().find_map(|entry| {
            entry.matcher.test(path).map(|captures| RouteMatch {
                entry: Arc::clone(entry),
                captures,
            })
        })
    }

    /// Returns the entry with the given identifier.
    pub fn get(&self, id: RouteId) -> Option<&Arc<RouteEntry>> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Iterates over entries in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the target used by routes that do not name one.
    pub fn default_target(&self) -> &str {
        &self.default_target
    }
}
