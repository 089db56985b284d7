//! Core error types for waypost.
//!
//! [`WaypostError`] covers the two failure families the router knows about:
//! configuration mistakes caught at registration or load time, and failures
//! raised by user callbacks (listeners, route handlers, view hooks) while a
//! location change is being dispatched. A location that matches no route and
//! a mount point that cannot be resolved are not errors.

use thiserror::Error;

/// The primary error type for waypost.
#[derive(Error, Debug)]
pub enum WaypostError {
    // ── Configuration ────────────────────────────────────────────────

    /// A route rule, setting, or mode is invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Callbacks ────────────────────────────────────────────────────

    /// A navigation listener failed.
    #[error("Listener error: {0}")]
    ListenerError(String),

    /// A route handler failed.
    #[error("Handler error: {0}")]
    HandlerError(String),

    /// A view lifecycle hook failed.
    #[error("Hook `{hook}` failed: {message}")]
    HookError {
        /// The name of the hook that was invoked.
        hook: String,
        /// What went wrong.
        message: String,
    },

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WaypostError {
    /// Creates a [`WaypostError::HookError`] for the named hook.
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookError {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors raised while registering or configuring,
    /// as opposed to errors raised by callbacks during dispatch.
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationError(_) | Self::IoError(_))
    }

    /// Returns a short, stable label for the error family, used as a log field.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationError(_) => "configuration",
            Self::ListenerError(_) => "listener",
            Self::HandlerError(_) => "handler",
            Self::HookError { .. } => "hook",
            Self::IoError(_) => "io",
        }
    }
}

/// A convenience type alias for `Result<T, WaypostError>`.
pub type WaypostResult<T> = Result<T, WaypostError>;
