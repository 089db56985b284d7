//! # waypost-test
//!
//! Testing utilities for waypost. Provides views that record their lifecycle
//! into a shared log, a locator that tests drive by hand, and a listener
//! that captures every navigation it sees.
//!
//! ## Modules
//!
//! - [`view_log`]: [`RecordingView`](view_log::RecordingView) and its shared [`ViewLog`](view_log::ViewLog)
//! - [`locator`]: [`ScriptedLocator`](locator::ScriptedLocator), a locator with call counters
//! - [`listener`]: [`ListenerLog`](listener::ListenerLog), a capturing navigation listener

pub mod listener;
pub mod locator;
pub mod view_log;

pub use listener::ListenerLog;
pub use locator::{ScriptedLocator, ScriptedLocators};
pub use view_log::{RecordingView, ViewEvent, ViewLog};
