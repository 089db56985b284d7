//! Recording views for reconciler assertions.
//!
//! Every [`RecordingView`] built by [`ViewLog::factory`] writes its lifecycle
//! into the log it came from. Instances are labelled `name#serial`, with the
//! serial counting up from 1 per factory, so a test can tell a reused view
//! from a freshly created one.
//!
//! ## Example
//!
//! ```
//! use waypost_router::{Location, View};
//! use waypost_test::view_log::{ViewEvent, ViewLog};
//!
//! let log = ViewLog::new();
//! let factory = log.factory("home");
//!
//! let mut view = factory();
//! view.set_data("route", &Location::new("/"));
//! view.dispose();
//!
//! assert_eq!(log.created(), vec!["home#1"]);
//! assert_eq!(log.disposed(), vec!["home#1"]);
//! assert!(matches!(log.events()[1], ViewEvent::Data { .. }));
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use waypost_core::{WaypostError, WaypostResult};
use waypost_router::{Location, MountPoint, View};

/// One lifecycle step of a recording view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The factory built a new instance.
    Created(String),
    /// The reconciler stored a location in the view's data.
    Data {
        instance: String,
        key: String,
        location: Location,
    },
    /// The reconciler invoked a lifecycle hook.
    Hook { instance: String, hook: String },
    /// The view was attached to a mount point.
    Attached {
        instance: String,
        target: String,
        node: usize,
    },
    /// The view was disposed.
    Disposed(String),
}

impl ViewEvent {
    /// Returns the `name#serial` label of the instance the event belongs to.
    pub fn instance(&self) -> &str {
        match self {
            Self::Created(instance) | Self::Disposed(instance) => instance,
            Self::Data { instance, .. }
            | Self::Hook { instance, .. }
            | Self::Attached { instance, .. } => instance,
        }
    }
}

/// A shared, thread-safe log of view lifecycle events.
#[derive(Debug, Clone, Default)]
pub struct ViewLog {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl ViewLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view factory whose views record into this log.
    pub fn factory(&self, name: &str) -> impl Fn() -> Box<dyn View> + Send + Sync + 'static {
        self.build_factory(name, false)
    }

    /// Like [`factory`](Self::factory), but every view's hook fails.
    pub fn failing_factory(
        &self,
        name: &str,
    ) -> impl Fn() -> Box<dyn View> + Send + Sync + 'static {
        self.build_factory(name, true)
    }

    fn build_factory(
        &self,
        name: &str,
        fail_hook: bool,
    ) -> impl Fn() -> Box<dyn View> + Send + Sync + 'static {
        let log = self.clone();
        let name = name.to_string();
        let serial = AtomicUsize::new(0);
        move || -> Box<dyn View> {
            let n = serial.fetch_add(1, Ordering::SeqCst) + 1;
            Box::new(RecordingView::new(format!("{name}#{n}"), log.clone(), fail_hook))
        }
    }

    /// Appends an event.
    pub fn record(&self, event: ViewEvent) {
        self.lock().push(event);
    }

    /// Returns a copy of every recorded event, oldest first.
    pub fn events(&self) -> Vec<ViewEvent> {
        self.lock().clone()
    }

    /// Returns the labels of every created instance, in creation order.
    pub fn created(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Created(instance) => Some(instance.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the labels of every disposed instance, in disposal order.
    pub fn disposed(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Disposed(instance) => Some(instance.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the most recent location stored in `instance`.
    pub fn last_location(&self, instance: &str) -> Option<Location> {
        self.lock().iter().rev().find_map(|event| match event {
            ViewEvent::Data {
                instance: i,
                location,
                ..
            } if i == instance => Some(location.clone()),
            _ => None,
        })
    }

    /// Returns how many hook invocations `instance` received.
    pub fn hook_count(&self, instance: &str) -> usize {
        self.lock()
            .iter()
            .filter(|event| matches!(event, ViewEvent::Hook { instance: i, .. } if i == instance))
            .count()
    }

    /// Returns the mount point targets `instance` was attached to.
    pub fn attachments(&self, instance: &str) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Attached {
                    instance: i,
                    target,
                    ..
                } if i == instance => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ViewEvent>> {
        self.events.lock().expect("ViewLog lock poisoned")
    }
}

/// A view that records its lifecycle into a [`ViewLog`].
#[derive(Debug)]
pub struct RecordingView {
    instance: String,
    log: ViewLog,
    fail_hook: bool,
}

impl RecordingView {
    /// Creates a view and records its creation.
    pub fn new(instance: impl Into<String>, log: ViewLog, fail_hook: bool) -> Self {
        let instance = instance.into();
        log.record(ViewEvent::Created(instance.clone()));
        Self {
            instance,
            log,
            fail_hook,
        }
    }

    /// Returns the `name#serial` label.
    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl View for RecordingView {
    fn set_data(&mut self, key: &str, location: &Location) {
        self.log.record(ViewEvent::Data {
            instance: self.instance.clone(),
            key: key.to_string(),
            location: location.clone(),
        });
    }

    fn invoke_hook(&mut self, hook: &str) -> WaypostResult<()> {
        self.log.record(ViewEvent::Hook {
            instance: self.instance.clone(),
            hook: hook.to_string(),
        });
        if self.fail_hook {
            return Err(WaypostError::hook(hook, format!("{} refused", self.instance)));
        }
        Ok(())
    }

    fn attach(&mut self, mount_point: &MountPoint) {
        self.log.record(ViewEvent::Attached {
            instance: self.instance.clone(),
            target: mount_point.target().to_string(),
            node: mount_point.node(),
        });
    }

    fn dispose(&mut self) {
        self.log.record(ViewEvent::Disposed(self.instance.clone()));
    }
}
