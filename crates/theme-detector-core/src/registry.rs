//! Thread-safe listener registry.
//!
//! Listeners are observers of theme changes. They are stored as [`Listener`]
//! handles whose equality is the identity of the underlying allocation, so a
//! caller removes "this exact listener" by handing back a clone of the handle
//! it registered.
//!
//! # Thread Safety
//!
//! All operations may be called from any number of threads, including from
//! inside a listener while [`ListenerRegistry::for_each`] is running. The
//! internal lock is held only to copy or mutate the listener list, never
//! while a listener runs.
//!
//! # Example
//!
//! ```
//! use theme_detector_core::{Listener, ListenerRegistry, ThemeState};
//!
//! let registry = ListenerRegistry::new();
//! let listener = Listener::new(|state| println!("theme is now {state}"));
//!
//! assert!(registry.add(&listener));
//! assert!(!registry.add(&listener)); // already present
//!
//! registry.for_each(|l| l.call(ThemeState::Dark));
//!
//! assert!(registry.remove(&listener));
//! assert!(registry.is_empty());
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::theme::ThemeState;

/// A theme change observer.
///
/// Cloning a `Listener` yields another handle to the same observer; two
/// listeners built from identical closures are still distinct.
#[derive(Clone)]
pub struct Listener {
    callback: Arc<dyn Fn(ThemeState) + Send + Sync>,
}

impl Listener {
    /// Wrap a closure as a listener.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(ThemeState) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Invoke the listener.
    pub fn call(&self, state: ThemeState) {
        (self.callback)(state);
    }

    /// Address of the shared allocation, used as the listener's identity.
    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.callback) as *const ()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        // Compare data pointers only; vtable pointers are not unique.
        self.addr() == other.addr()
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.addr()).finish()
    }
}

/// A set of listeners with identity-based uniqueness.
///
/// Insertion order is kept but carries no meaning for callers.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Listener>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener.
    ///
    /// Returns `true` if the listener was newly added, `false` if the same
    /// listener was already registered.
    pub fn add(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| l == listener) {
            tracing::trace!(target: "theme_detector_core::registry", "listener already registered");
            return false;
        }
        listeners.push(listener.clone());
        tracing::trace!(target: "theme_detector_core::registry", count = listeners.len(), "listener added");
        true
    }

    /// Remove a listener.
    ///
    /// Returns `true` if the listener was found and removed.
    pub fn remove(&self, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        match listeners.iter().position(|l| l == listener) {
            Some(index) => {
                listeners.remove(index);
                tracing::trace!(target: "theme_detector_core::registry", count = listeners.len(), "listener removed");
                true
            }
            None => false,
        }
    }

    /// Check whether a listener is registered.
    pub fn contains(&self, listener: &Listener) -> bool {
        self.listeners.lock().iter().any(|l| l == listener)
    }

    /// Check if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Get the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Copy the current listeners.
    ///
    /// The returned handles keep their listeners alive even if they are
    /// removed from the registry afterwards.
    pub fn snapshot(&self) -> Vec<Listener> {
        self.listeners.lock().clone()
    }

    /// Visit every listener present when the traversal starts.
    ///
    /// The visitor runs without the registry lock held, so it may add or
    /// remove listeners. Listeners added during the traversal are not
    /// visited; listeners removed during it may still be visited once.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Listener),
    {
        for listener in self.snapshot() {
            visitor(&listener);
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(Listener: Send, Sync);
static_assertions::assert_impl_all!(ListenerRegistry: Send, Sync);
