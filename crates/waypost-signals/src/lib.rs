//! # waypost-signals
//!
//! Ordered receiver lists for waypost. A [`Signal`] is how the router fans a
//! single event out to many callbacks: navigation listeners receive every
//! matched location, and locators notify their subscribers of redirects.
//!
//! Receivers are identified by the `Arc` they were connected with. Connecting
//! the same `Arc` twice registers it twice, and disconnecting it removes
//! every registration.
//!
//! ## Usage
//!
//! ```
//! use waypost_signals::{Receiver, Signal};
//! use std::sync::Arc;
//!
//! let signal: Signal<String> = Signal::new();
//!
//! let logger: Receiver<String> = Arc::new(|msg: &String| {
//!     println!("navigated to {msg}");
//!     Ok(())
//! });
//! signal.connect(Arc::clone(&logger));
//!
//! signal.send(&"/list/shoes".to_string()).unwrap();
//! assert_eq!(signal.disconnect(&logger), 1);
//! ```

use std::sync::{Arc, RwLock};

use waypost_core::{WaypostError, WaypostResult};

/// The type signature for a signal receiver callback.
///
/// Receivers accept a reference to the payload and may fail; a failure stops
/// [`Signal::send`] at that receiver.
pub type Receiver<T> = Arc<dyn Fn(&T) -> WaypostResult<()> + Send + Sync>;

/// An ordered list of receivers for payloads of type `T`.
///
/// Receivers are called in the order they were connected. The receiver list
/// is snapshotted before dispatch, so a receiver may connect or disconnect
/// receivers (including itself) while being called; the change applies from
/// the next send.
pub struct Signal<T: 'static> {
    receivers: RwLock<Vec<Receiver<T>>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

/// Compares receivers by allocation, ignoring vtable pointers.
fn same_receiver<T>(a: &Receiver<T>, b: &Receiver<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub fn new() -> Self {
        Self {
            receivers: RwLock::new(Vec::new()),
        }
    }

    /// Appends a receiver. Duplicates are allowed and are called once per
    /// registration.
    pub fn connect(&self, receiver: Receiver<T>) {
        self.receivers
            .write()
            .expect("signal lock poisoned")
            .push(receiver);
    }

    /// Removes every registration of `receiver`.
    ///
    /// Returns the number of registrations removed.
    pub fn disconnect(&self, receiver: &Receiver<T>) -> usize {
        let mut receivers = self.receivers.write().expect("signal lock poisoned");
        let len_before = receivers.len();
        receivers.retain(|r| !same_receiver(r, receiver));
        len_before - receivers.len()
    }

    /// Returns `true` if `receiver` is registered at least once.
    pub fn is_connected(&self, receiver: &Receiver<T>) -> bool {
        self.receivers
            .read()
            .expect("signal lock poisoned")
            .iter()
            .any(|r| same_receiver(r, receiver))
    }

    /// Sends the payload to all receivers in connection order.
    ///
    /// # Errors
    ///
    /// Returns the first receiver error; the remaining receivers are not called.
    pub fn send(&self, payload: &T) -> WaypostResult<()> {
        for receiver in self.snapshot() {
            receiver(payload)?;
        }
        Ok(())
    }

    /// Sends the payload to all receivers, even if some of them fail.
    ///
    /// Returns the errors in the order they occurred.
    pub fn send_isolated(&self, payload: &T) -> Vec<WaypostError> {
        self.snapshot()
            .into_iter()
            .filter_map(|receiver| receiver(payload).err())
            .collect()
    }

    /// Returns the number of registrations.
    pub fn receiver_count(&self) -> usize {
        self.receivers.read().expect("signal lock poisoned").len()
    }

    /// Removes all receivers.
    pub fn clear(&self) {
        self.receivers.write().expect("signal lock poisoned").clear();
    }

    fn snapshot(&self) -> Vec<Receiver<T>> {
        self.receivers.read().expect("signal lock poisoned").clone()
    }
}
