//! The detector facade.
//!
//! Every platform exposes the same [`ThemeDetector`] contract:
//!
//! - [`is_dark`](ThemeDetector::is_dark) samples the theme synchronously and
//!   never depends on a background loop being alive.
//! - [`register_listener`](ThemeDetector::register_listener) and
//!   [`remove_listener`](ThemeDetector::remove_listener) manage observers that
//!   are called, on a background thread, once per detected theme change.
//!
//! Three implementations cover the platforms:
//!
//! - [`MonitoredDetector`] runs one [`MonitorLoop`] while at least one
//!   listener is registered and stops it when the last one is removed.
//! - [`ObserverDetector`] keeps a single long-lived native observer feeding an
//!   [`EventExecutor`] for the whole process lifetime.
//! - [`NoOpDetector`] reports light and ignores listeners.
//!
//! # State Machine
//!
//! ```text
//!            register (0 → 1)                 register (loop dead)
//!   Idle ────────────────────────► Active ◄────────────────────┐
//!    ▲                              │  └───────────────────────┘
//!    └──────────────────────────────┘
//!          remove (→ 0): stop loop, forget handle
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatch::NotificationDispatcher;
use crate::error::MonitorError;
use crate::executor::{EventExecutor, EventSender};
use crate::monitor::{EstablishSource, MonitorHandle, MonitorLoop};
use crate::probe::DetectorKind;
use crate::registry::{Listener, ListenerRegistry};
use crate::sampler::ThemeSampler;
use crate::theme::ThemeState;

/// Detects the OS theme and notifies listeners when it changes.
///
/// All methods are safe to call from any thread. Listeners run on a
/// background thread and must not assume caller-thread affinity.
pub trait ThemeDetector: Send + Sync {
    /// Which platform implementation this is.
    fn kind(&self) -> DetectorKind;

    /// Returns true if the OS currently uses a dark theme.
    ///
    /// Sampling failures are logged and reported as light.
    fn is_dark(&self) -> bool;

    /// Register a listener. Registering the same listener twice has no effect.
    fn register_listener(&self, listener: &Listener);

    /// Remove a listener. Removing an unknown listener has no effect.
    fn remove_listener(&self, listener: &Listener);

    /// Number of registered listeners.
    fn listener_count(&self) -> usize;

    /// Returns true if a background watcher is currently running.
    fn is_monitoring(&self) -> bool;

    /// The current theme as a [`ThemeState`].
    fn theme(&self) -> ThemeState {
        ThemeState::from(self.is_dark())
    }
}

impl<'a> dyn ThemeDetector + 'a {
    /// Register a closure and get a guard that removes it when dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use theme_detector_core::{NoOpDetector, ThemeDetector};
    ///
    /// let detector: &dyn ThemeDetector = &NoOpDetector;
    /// let subscription = detector.subscribe(|state| println!("now {state}"));
    /// drop(subscription); // listener removed
    /// ```
    pub fn subscribe<F>(&self, callback: F) -> Subscription<'_>
    where
        F: Fn(ThemeState) + Send + Sync + 'static,
    {
        let listener = Listener::new(callback);
        self.register_listener(&listener);
        Subscription {
            detector: self,
            listener: Some(listener),
        }
    }
}

/// A registered listener that is removed when the guard is dropped.
///
/// Created by `subscribe` on a `dyn ThemeDetector`.
#[must_use = "dropping a Subscription removes its listener immediately"]
pub struct Subscription<'a> {
    detector: &'a dyn ThemeDetector,
    listener: Option<Listener>,
}

impl Subscription<'_> {
    /// The registered listener.
    pub fn listener(&self) -> Option<&Listener> {
        self.listener.as_ref()
    }

    /// Keep the listener registered and return its handle.
    pub fn into_listener(mut self) -> Option<Listener> {
        self.listener.take()
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.detector.remove_listener(&listener);
        }
    }
}

impl fmt::Debug for Subscription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.detector.kind())
            .field("listener", &self.listener)
            .finish()
    }
}

/// Creates a fresh change source each time a monitor loop starts.
pub type SourceLauncher = Box<dyn Fn() -> EstablishSource + Send + Sync>;

/// A detector that runs a monitor loop while it has listeners.
///
/// Registration and removal are serialized by one lock; that lock is never
/// taken by [`is_dark`](ThemeDetector::is_dark) or by the monitor loop.
pub struct MonitoredDetector {
    kind: DetectorKind,
    thread_name: String,
    sampler: Arc<dyn ThemeSampler>,
    registry: Arc<ListenerRegistry>,
    dispatcher: NotificationDispatcher,
    launcher: SourceLauncher,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl MonitoredDetector {
    /// Create an idle detector.
    ///
    /// `launcher` is called each time a monitor loop starts; the source it
    /// returns is established on the monitor thread.
    pub fn new(
        kind: DetectorKind,
        thread_name: impl Into<String>,
        sampler: Arc<dyn ThemeSampler>,
        launcher: SourceLauncher,
    ) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        Self {
            kind,
            thread_name: thread_name.into(),
            sampler,
            dispatcher: NotificationDispatcher::new(registry.clone()),
            registry,
            launcher,
            monitor: Mutex::new(None),
        }
    }

    /// The monitor thread name.
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    fn start_monitor(&self) -> Result<MonitorHandle, MonitorError> {
        let baseline = self.sampler.sample_or_light();
        MonitorLoop::spawn(
            self.thread_name.clone(),
            baseline,
            (self.launcher)(),
            self.dispatcher.clone(),
        )
    }
}

impl ThemeDetector for MonitoredDetector {
    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn is_dark(&self) -> bool {
        self.sampler.sample_or_light().is_dark()
    }

    fn register_listener(&self, listener: &Listener) {
        let mut monitor = self.monitor.lock();
        self.registry.add(listener);

        if self.registry.is_empty() || monitor.as_ref().is_some_and(MonitorHandle::is_alive) {
            return;
        }

        if let Some(dead) = monitor.take() {
            tracing::warn!(
                target: "theme_detector_core::detector",
                kind = %self.kind,
                name = dead.name(),
                "monitor loop terminated unexpectedly, restarting"
            );
            dead.stop();
        }

        match self.start_monitor() {
            Ok(handle) => *monitor = Some(handle),
            Err(err) => {
                tracing::error!(target: "theme_detector_core::detector", kind = %self.kind, error = %err, "couldn't start monitor loop");
            }
        }
    }

    fn remove_listener(&self, listener: &Listener) {
        let mut monitor = self.monitor.lock();
        self.registry.remove(listener);

        if self.registry.is_empty() {
            if let Some(handle) = monitor.take() {
                handle.stop();
            }
        }
    }

    fn listener_count(&self) -> usize {
        self.registry.len()
    }

    fn is_monitoring(&self) -> bool {
        self.monitor.lock().as_ref().is_some_and(MonitorHandle::is_alive)
    }
}

impl fmt::Debug for MonitoredDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoredDetector")
            .field("kind", &self.kind)
            .field("thread_name", &self.thread_name)
            .field("listeners", &self.registry.len())
            .finish()
    }
}

/// A detector fed by a long-lived native observer.
///
/// The observer and its executor are created once, at construction, and live
/// for the rest of the process. Listener registration only touches the
/// registry; with no listeners, dispatch is a no-op.
pub struct ObserverDetector {
    kind: DetectorKind,
    sampler: Arc<dyn ThemeSampler>,
    registry: Arc<ListenerRegistry>,
    executor: Option<EventExecutor>,
}

impl ObserverDetector {
    /// Create the detector and install the native observer.
    ///
    /// `install` receives the executor's inbound handle and registers the
    /// native callback that posts to it. Failures are logged; the detector
    /// keeps answering [`is_dark`](ThemeDetector::is_dark) without change
    /// notifications.
    pub fn new<I>(
        kind: DetectorKind,
        thread_name: impl Into<String>,
        sampler: Arc<dyn ThemeSampler>,
        install: I,
    ) -> Self
    where
        I: FnOnce(EventSender) -> Result<(), MonitorError>,
    {
        let registry = Arc::new(ListenerRegistry::new());
        let dispatcher = NotificationDispatcher::new(registry.clone());

        let executor = match EventExecutor::spawn(thread_name, sampler.clone(), dispatcher) {
            Ok(executor) => Some(executor),
            Err(err) => {
                tracing::error!(target: "theme_detector_core::detector", %kind, error = %err, "couldn't start event executor");
                None
            }
        };

        if let Some(executor) = &executor {
            if let Err(err) = install(executor.sender()) {
                tracing::error!(target: "theme_detector_core::detector", %kind, error = %err, "couldn't install native observer");
            }
        }

        Self {
            kind,
            sampler,
            registry,
            executor,
        }
    }
}

impl ThemeDetector for ObserverDetector {
    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn is_dark(&self) -> bool {
        self.sampler.sample_or_light().is_dark()
    }

    fn register_listener(&self, listener: &Listener) {
        self.registry.add(listener);
    }

    fn remove_listener(&self, listener: &Listener) {
        self.registry.remove(listener);
    }

    fn listener_count(&self) -> usize {
        self.registry.len()
    }

    fn is_monitoring(&self) -> bool {
        self.executor.as_ref().is_some_and(EventExecutor::is_alive)
    }
}

impl fmt::Debug for ObserverDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverDetector")
            .field("kind", &self.kind)
            .field("listeners", &self.registry.len())
            .field("executor", &self.executor)
            .finish()
    }
}

/// The detector for unsupported systems.
///
/// Always reports light; listener operations do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDetector;

impl ThemeDetector for NoOpDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Unsupported
    }

    fn is_dark(&self) -> bool {
        false
    }

    fn register_listener(&self, _listener: &Listener) {}

    fn remove_listener(&self, _listener: &Listener) {}

    fn listener_count(&self) -> usize {
        0
    }

    fn is_monitoring(&self) -> bool {
        false
    }
}

static_assertions::assert_impl_all!(MonitoredDetector: Send, Sync);
static_assertions::assert_impl_all!(ObserverDetector: Send, Sync);
static_assertions::assert_impl_all!(NoOpDetector: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_detector() {
        let detector = NoOpDetector;
        let listener = Listener::new(|_| panic!("never called"));

        assert!(!detector.is_dark());
        assert_eq!(detector.theme(), ThemeState::Light);
        detector.register_listener(&listener);
        assert_eq!(detector.listener_count(), 0);
        assert!(!detector.is_monitoring());
        detector.remove_listener(&listener);
        assert_eq!(detector.kind(), DetectorKind::Unsupported);
    }

    #[test]
    fn test_observer_detector_install_failure_still_samples() {
        let sampler: Arc<dyn ThemeSampler> = Arc::new(|| -> Result<bool, crate::SampleError> { Ok(true) });
        let detector = ObserverDetector::new(DetectorKind::MacOs, "observer test", sampler, |_events| {
            Err(MonitorError::establish("no notification center"))
        });

        assert!(detector.is_dark());
        let listener = Listener::new(|_| {});
        detector.register_listener(&listener);
        detector.register_listener(&listener);
        assert_eq!(detector.listener_count(), 1);
        detector.remove_listener(&listener);
        assert_eq!(detector.listener_count(), 0);
    }
}
