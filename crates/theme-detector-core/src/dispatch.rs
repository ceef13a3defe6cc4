//! Fan-out of theme changes to registered listeners.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::ListenerError;
use crate::registry::ListenerRegistry;
use crate::theme::ThemeState;

/// Outcome of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Listeners that returned normally.
    pub delivered: usize,
    /// Listeners that panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// Total number of listeners invoked.
    pub fn invoked(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Delivers a theme state to every listener in a registry.
///
/// A panicking listener is caught and logged; the remaining listeners are
/// still invoked and the panic never reaches the caller.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    registry: Arc<ListenerRegistry>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over a shared registry.
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher delivers to.
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// Invoke every registered listener once with `state`.
    ///
    /// Dispatching against an empty registry is a no-op.
    #[tracing::instrument(skip(self), target = "theme_detector_core::dispatch", level = "trace")]
    pub fn dispatch(&self, state: ThemeState) -> DispatchReport {
        let mut report = DispatchReport::default();

        self.registry.for_each(|listener| {
            match catch_unwind(AssertUnwindSafe(|| listener.call(state))) {
                Ok(()) => report.delivered += 1,
                Err(payload) => {
                    report.failed += 1;
                    let err = ListenerError::from_panic(payload.as_ref());
                    tracing::error!(
                        target: "theme_detector_core::dispatch",
                        %state,
                        error = %err,
                        "caught panic during listener notification"
                    );
                }
            }
        });

        tracing::trace!(
            target: "theme_detector_core::dispatch",
            delivered = report.delivered,
            failed = report.failed,
            "dispatch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Listener;
    use parking_lot::Mutex;

    #[test]
    fn test_dispatch_reaches_every_listener() {
        let registry = Arc::new(ListenerRegistry::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let received_clone = received.clone();
            registry.add(&Listener::new(move |state| {
                received_clone.lock().push((i, state));
            }));
        }

        let report = NotificationDispatcher::new(registry).dispatch(ThemeState::Dark);
        assert_eq!(report.delivered, 3);
        assert_eq!(report.failed, 0);

        let mut values = received.lock().clone();
        values.sort_by_key(|(i, _)| *i);
        assert_eq!(
            values,
            vec![
                (0, ThemeState::Dark),
                (1, ThemeState::Dark),
                (2, ThemeState::Dark)
            ]
        );
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = Arc::new(ListenerRegistry::new());
        let count = Arc::new(Mutex::new(0));

        for i in 0..5 {
            let count_clone = count.clone();
            registry.add(&Listener::new(move |_| {
                if i == 2 {
                    panic!("listener {i} failed");
                }
                *count_clone.lock() += 1;
            }));
        }

        let report = NotificationDispatcher::new(registry).dispatch(ThemeState::Light);
        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 4);
        assert_eq!(report.invoked(), 5);
        assert_eq!(*count.lock(), 4);
    }

    #[test]
    fn test_dispatch_empty_registry() {
        let dispatcher = NotificationDispatcher::new(Arc::new(ListenerRegistry::new()));
        assert_eq!(dispatcher.dispatch(ThemeState::Dark), DispatchReport::default());
    }
}
