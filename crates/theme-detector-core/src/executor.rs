//! Callback-driven monitoring.
//!
//! Some platforms deliver theme changes through a native callback on a
//! thread the library does not own. The callback should do nothing but post
//! an event through an [`EventSender`]; a single-threaded [`EventExecutor`]
//! owned by the detector re-samples and dispatches, keeping listener code off
//! the native thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::dispatch::NotificationDispatcher;
use crate::error::MonitorError;
use crate::monitor::AliveGuard;
use crate::sampler::ThemeSampler;
use crate::theme::ThemeState;

/// Inbound handle for "the theme may have changed" events.
///
/// Cheap to clone and safe to move into native callbacks.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Sender<()>,
}

impl EventSender {
    /// Post a change event. Returns `false` if the executor has exited.
    pub fn notify(&self) -> bool {
        self.sender.send(()).is_ok()
    }
}

/// A dedicated thread that turns change events into dispatches.
///
/// The executor keeps a last-known baseline so a notification that does not
/// change the observed state is not forwarded to listeners. It runs until
/// every [`EventSender`] has been dropped.
#[derive(Debug)]
pub struct EventExecutor {
    name: String,
    sender: EventSender,
    alive: Arc<AtomicBool>,
}

impl EventExecutor {
    /// Spawn the executor thread.
    ///
    /// The baseline is sampled synchronously before the thread starts.
    pub fn spawn(
        name: impl Into<String>,
        sampler: Arc<dyn ThemeSampler>,
        dispatcher: NotificationDispatcher,
    ) -> Result<Self, MonitorError> {
        let name = name.into();
        let (sender, receiver) = unbounded();
        let baseline = sampler.sample_or_light();
        let alive = Arc::new(AtomicBool::new(true));

        let thread_alive = alive.clone();
        let thread_name = name.clone();
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _alive = AliveGuard(thread_alive);
                run_executor(&thread_name, baseline, receiver, sampler.as_ref(), &dispatcher);
            })
            .map_err(|source| MonitorError::Spawn {
                name: name.clone(),
                source,
            })?;

        tracing::debug!(target: "theme_detector_core::monitor", name = %name, %baseline, "event executor started");
        Ok(Self {
            name,
            sender: EventSender { sender },
            alive,
        })
    }

    /// A new inbound handle.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Returns true while the executor thread is running.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// The thread name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn run_executor(
    name: &str,
    baseline: ThemeState,
    events: Receiver<()>,
    sampler: &dyn ThemeSampler,
    dispatcher: &NotificationDispatcher,
) {
    let mut last = baseline;
    while events.recv().is_ok() {
        // Coalesce a burst of notifications into one sample.
        while events.try_recv().is_ok() {}

        let state = match sampler.sample_is_dark() {
            Ok(is_dark) => ThemeState::from(is_dark),
            Err(err) => {
                tracing::warn!(target: "theme_detector_core::monitor", name, error = %err, "sample failed, skipping event");
                continue;
            }
        };

        if state != last {
            last = state;
            tracing::debug!(target: "theme_detector_core::monitor", name, %state, "theme change detected");
            dispatcher.dispatch(state);
        }
    }
    tracing::debug!(target: "theme_detector_core::monitor", name, "event executor exited");
}
