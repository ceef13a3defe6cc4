//! Background monitor loops.
//!
//! A monitor loop runs on a dedicated, named thread. It starts from a
//! baseline theme state sampled synchronously by the caller, repeatedly asks
//! its [`ChangeSource`] for the next candidate state, and dispatches to the
//! listeners only when the candidate differs from the last known state.
//!
//! Three change sources cover every platform:
//!
//! - [`NotificationSource`]: blocks on a kernel-level change event (see
//!   [`ChangeWait`]), then re-samples.
//! - [`StreamSource`]: reads lines emitted by a long-lived monitoring
//!   subprocess and parses the new value straight from the line.
//! - [`PollingSource`]: re-samples on a fixed interval.
//!
//! # Lifecycle
//!
//! ```text
//!   spawn ──► establish source ──► loop { next_state → compare → dispatch }
//!                  │ error                   │ stop / fatal error
//!                  ▼                         ▼
//!                exit ◄──────────── drop source (kill subprocess, close handle)
//! ```
//!
//! Stopping is cooperative: [`MonitorHandle::stop`] sets a flag that the loop
//! observes at its next iteration boundary. Callers never wait for the thread
//! to exit. A loop that exits for any reason other than a stop request is
//! reported as dead by [`MonitorHandle::is_alive`].

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};

use crate::cancel::CancellationToken;
use crate::dispatch::NotificationDispatcher;
use crate::error::MonitorError;
use crate::sampler::ThemeSampler;
use crate::theme::ThemeState;

/// Produces candidate theme states for a monitor loop.
pub trait ChangeSource: Send {
    /// Block until the next candidate state is available.
    ///
    /// Returns `Ok(None)` when the source woke without a candidate (a wait
    /// slice elapsed, an irrelevant line arrived, a sample failed). Any
    /// `Err` is fatal and ends the loop.
    fn next_state(&mut self, stop: &CancellationToken) -> Result<Option<ThemeState>, MonitorError>;
}

/// A platform change-notification primitive.
pub trait ChangeWait: Send {
    /// Wait up to `timeout` for a change.
    ///
    /// Returns `Ok(true)` if a change was signalled, `Ok(false)` on timeout.
    fn wait_for_change(&mut self, timeout: Duration) -> Result<bool, MonitorError>;
}

/// Blocks on a [`ChangeWait`] and re-samples after each signalled change.
pub struct NotificationSource<W> {
    wait: W,
    sampler: Arc<dyn ThemeSampler>,
    slice: Duration,
}

impl<W: ChangeWait> NotificationSource<W> {
    /// Create a notification-driven source.
    ///
    /// `slice` bounds each blocking wait so the stop flag is re-checked.
    pub fn new(wait: W, sampler: Arc<dyn ThemeSampler>, slice: Duration) -> Self {
        Self {
            wait,
            sampler,
            slice,
        }
    }
}

impl<W: ChangeWait> ChangeSource for NotificationSource<W> {
    fn next_state(&mut self, _stop: &CancellationToken) -> Result<Option<ThemeState>, MonitorError> {
        if !self.wait.wait_for_change(self.slice)? {
            return Ok(None);
        }
        Ok(sample_candidate(self.sampler.as_ref()))
    }
}

/// Re-samples on a fixed interval.
pub struct PollingSource {
    sampler: Arc<dyn ThemeSampler>,
    interval: Duration,
}

impl PollingSource {
    /// Create a polling source.
    pub fn new(sampler: Arc<dyn ThemeSampler>, interval: Duration) -> Self {
        Self { sampler, interval }
    }
}

impl ChangeSource for PollingSource {
    fn next_state(&mut self, stop: &CancellationToken) -> Result<Option<ThemeState>, MonitorError> {
        if !self.interval.is_zero() && stop.wait_timeout(self.interval) {
            return Ok(None);
        }
        if stop.is_cancelled() {
            return Ok(None);
        }
        Ok(sample_candidate(self.sampler.as_ref()))
    }
}

type LineParser = Box<dyn Fn(&str) -> Option<ThemeState> + Send>;

/// Reads change lines from a monitoring stream.
///
/// A helper thread performs the blocking reads and forwards each line over a
/// channel, so the monitor loop itself only blocks for one wait slice at a
/// time. The optional resource (typically the monitoring subprocess) is
/// dropped together with the source, which ends the stream and the helper.
pub struct StreamSource {
    lines: Receiver<std::io::Result<String>>,
    parser: LineParser,
    slice: Duration,
    _resource: Option<Box<dyn Send>>,
}

impl StreamSource {
    /// Start reading `reader` on a helper thread.
    ///
    /// `parser` returns the state carried by a relevant line, or `None` for
    /// lines that do not concern the theme.
    pub fn spawn<R, P>(
        name: &str,
        reader: R,
        parser: P,
        slice: Duration,
        resource: Option<Box<dyn Send>>,
    ) -> Result<Self, MonitorError>
    where
        R: BufRead + Send + 'static,
        P: Fn(&str) -> Option<ThemeState> + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let reader_name = format!("{name} Reader");

        thread::Builder::new()
            .name(reader_name.clone())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if sender.send(line).is_err() || failed {
                        break;
                    }
                }
            })
            .map_err(|source| MonitorError::Spawn {
                name: reader_name,
                source,
            })?;

        Ok(Self {
            lines: receiver,
            parser: Box::new(parser),
            slice,
            _resource: resource,
        })
    }
}

impl ChangeSource for StreamSource {
    fn next_state(&mut self, _stop: &CancellationToken) -> Result<Option<ThemeState>, MonitorError> {
        match self.lines.recv_timeout(self.slice) {
            Ok(Ok(line)) => {
                let state = (self.parser)(&line);
                if state.is_some() {
                    tracing::trace!(target: "theme_detector_core::monitor", line = %line, "relevant monitor line");
                }
                Ok(state)
            }
            Ok(Err(err)) => Err(MonitorError::stream(format!("couldn't read monitor output: {err}"))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(MonitorError::stream("monitor output closed")),
        }
    }
}

fn sample_candidate(sampler: &dyn ThemeSampler) -> Option<ThemeState> {
    match sampler.sample_is_dark() {
        Ok(is_dark) => Some(ThemeState::from(is_dark)),
        Err(err) => {
            tracing::warn!(target: "theme_detector_core::monitor", error = %err, "sample failed, skipping");
            None
        }
    }
}

/// Deferred construction of a change source, run on the monitor thread.
pub type EstablishSource =
    Box<dyn FnOnce() -> Result<Box<dyn ChangeSource>, MonitorError> + Send + 'static>;

/// Handle to a running monitor loop.
///
/// Dropping the handle does not stop the loop; call [`stop`](Self::stop).
#[derive(Debug)]
pub struct MonitorHandle {
    name: String,
    token: CancellationToken,
    alive: Arc<AtomicBool>,
}

impl MonitorHandle {
    /// Signal the loop to stop at its next iteration boundary.
    pub fn stop(&self) {
        tracing::debug!(target: "theme_detector_core::monitor", name = %self.name, "stop requested");
        self.token.cancel();
    }

    /// Returns true while the loop thread is running.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Returns true once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true if the loop ended without being asked to stop.
    pub fn is_dead(&self) -> bool {
        !self.is_alive() && !self.is_stopped()
    }

    /// The thread name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Clears the alive flag on every exit path, including panics.
pub(crate) struct AliveGuard(pub(crate) Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Spawns monitor loops.
pub struct MonitorLoop;

impl MonitorLoop {
    /// Spawn a monitor loop on a new named thread.
    ///
    /// `baseline` must be sampled by the caller before spawning so the first
    /// detected transition is measured against the state at start.
    pub fn spawn(
        name: impl Into<String>,
        baseline: ThemeState,
        establish: EstablishSource,
        dispatcher: NotificationDispatcher,
    ) -> Result<MonitorHandle, MonitorError> {
        let name = name.into();
        let token = CancellationToken::new();
        let alive = Arc::new(AtomicBool::new(true));

        let thread_token = token.clone();
        let thread_alive = alive.clone();
        let thread_name = name.clone();

        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            let _alive = AliveGuard(thread_alive);
            run_loop(&thread_name, baseline, establish, &dispatcher, &thread_token);
        });

        if let Err(source) = spawned {
            alive.store(false, Ordering::Release);
            return Err(MonitorError::Spawn { name, source });
        }

        tracing::debug!(target: "theme_detector_core::monitor", name = %name, %baseline, "monitor started");
        Ok(MonitorHandle { name, token, alive })
    }
}

fn run_loop(
    name: &str,
    baseline: ThemeState,
    establish: EstablishSource,
    dispatcher: &NotificationDispatcher,
    token: &CancellationToken,
) {
    let mut source = match establish() {
        Ok(source) => source,
        Err(err) => {
            tracing::error!(target: "theme_detector_core::monitor", name, error = %err, "couldn't start monitoring");
            return;
        }
    };

    let mut last = baseline;
    while !token.is_cancelled() {
        match source.next_state(token) {
            Ok(Some(state)) if state != last => {
                if token.is_cancelled() {
                    break;
                }
                last = state;
                tracing::debug!(target: "theme_detector_core::monitor", name, %state, "theme change detected");
                dispatcher.dispatch(state);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(target: "theme_detector_core::monitor", name, error = %err, "monitoring failed");
                break;
            }
        }
    }

    // Release the subprocess or native handle before the thread ends.
    drop(source);
    if token.is_cancelled() {
        tracing::debug!(target: "theme_detector_core::monitor", name, "monitor has been stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Listener, ListenerRegistry};
    use crossbeam_channel::Sender;
    use parking_lot::Mutex;
    use std::io::Cursor;
    use std::time::Instant;

    struct ScriptedSource {
        states: Receiver<ThemeState>,
    }

    impl ChangeSource for ScriptedSource {
        fn next_state(&mut self, _stop: &CancellationToken) -> Result<Option<ThemeState>, MonitorError> {
            match self.states.recv_timeout(Duration::from_millis(10)) {
                Ok(state) => Ok(Some(state)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(MonitorError::stream("script ended")),
            }
        }
    }

    fn scripted() -> (Sender<ThemeState>, EstablishSource) {
        let (sender, receiver) = unbounded();
        let establish: EstablishSource =
            Box::new(move || Ok(Box::new(ScriptedSource { states: receiver }) as Box<dyn ChangeSource>));
        (sender, establish)
    }

    fn recording_dispatcher() -> (NotificationDispatcher, Arc<Mutex<Vec<ThemeState>>>) {
        let registry = Arc::new(ListenerRegistry::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        registry.add(&Listener::new(move |state| received_clone.lock().push(state)));
        (NotificationDispatcher::new(registry), received)
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_only_transitions_are_dispatched() {
        let (dispatcher, received) = recording_dispatcher();
        let (states, establish) = scripted();
        let handle = MonitorLoop::spawn("test monitor", ThemeState::Light, establish, dispatcher).unwrap();

        for state in [
            ThemeState::Light,
            ThemeState::Dark,
            ThemeState::Dark,
            ThemeState::Light,
        ] {
            states.send(state).unwrap();
        }

        assert!(wait_until(|| received.lock().len() == 2));
        assert_eq!(*received.lock(), vec![ThemeState::Dark, ThemeState::Light]);

        handle.stop();
        assert!(wait_until(|| !handle.is_alive()));
        assert!(!handle.is_dead());
    }

    #[test]
    fn test_fatal_source_error_marks_loop_dead() {
        let (dispatcher, _received) = recording_dispatcher();
        let (states, establish) = scripted();
        let handle = MonitorLoop::spawn("dying monitor", ThemeState::Light, establish, dispatcher).unwrap();

        drop(states);

        assert!(wait_until(|| !handle.is_alive()));
        assert!(handle.is_dead());
    }

    #[test]
    fn test_establish_failure_marks_loop_dead() {
        let (dispatcher, _received) = recording_dispatcher();
        let establish: EstablishSource = Box::new(|| Err(MonitorError::establish("no handle")));
        let handle = MonitorLoop::spawn("broken monitor", ThemeState::Light, establish, dispatcher).unwrap();

        assert!(wait_until(|| !handle.is_alive()));
        assert!(handle.is_dead());
        assert_eq!(handle.name(), "broken monitor");
    }

    #[test]
    fn test_polling_source_samples_and_stops() {
        let dark = Arc::new(AtomicBool::new(false));
        let dark_clone = dark.clone();
        let sampler: Arc<dyn ThemeSampler> = Arc::new(move || -> Result<bool, crate::SampleError> {
            Ok(dark_clone.load(Ordering::SeqCst))
        });

        let token = CancellationToken::new();
        let mut source = PollingSource::new(sampler, Duration::ZERO);
        assert_eq!(source.next_state(&token).unwrap(), Some(ThemeState::Light));

        dark.store(true, Ordering::SeqCst);
        assert_eq!(source.next_state(&token).unwrap(), Some(ThemeState::Dark));

        token.cancel();
        assert_eq!(source.next_state(&token).unwrap(), None);
    }

    #[test]
    fn test_polling_source_wakes_on_stop() {
        let sampler: Arc<dyn ThemeSampler> = Arc::new(|| -> Result<bool, crate::SampleError> { Ok(true) });
        let token = CancellationToken::new();
        let mut source = PollingSource::new(sampler, Duration::from_secs(30));

        let stopper = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stopper.cancel();
        });

        let start = Instant::now();
        assert_eq!(source.next_state(&token).unwrap(), None);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_polling_source_with_unbounded_interval() {
        let sampler: Arc<dyn ThemeSampler> = Arc::new(|| -> Result<bool, crate::SampleError> { Ok(true) });
        let token = CancellationToken::new();
        token.cancel();
        let mut source = PollingSource::new(sampler, Duration::MAX);
        assert_eq!(source.next_state(&token).unwrap(), None);
    }

    struct FlagWait {
        pending: Arc<AtomicBool>,
    }

    impl ChangeWait for FlagWait {
        fn wait_for_change(&mut self, timeout: Duration) -> Result<bool, MonitorError> {
            if self.pending.swap(false, Ordering::SeqCst) {
                return Ok(true);
            }
            thread::sleep(timeout.min(Duration::from_millis(5)));
            Ok(false)
        }
    }

    #[test]
    fn test_notification_source_resamples_after_change() {
        let pending = Arc::new(AtomicBool::new(false));
        let sampler: Arc<dyn ThemeSampler> = Arc::new(|| -> Result<bool, crate::SampleError> { Ok(true) });
        let mut source = NotificationSource::new(
            FlagWait {
                pending: pending.clone(),
            },
            sampler,
            Duration::from_millis(5),
        );
        let token = CancellationToken::new();

        assert_eq!(source.next_state(&token).unwrap(), None);
        pending.store(true, Ordering::SeqCst);
        assert_eq!(source.next_state(&token).unwrap(), Some(ThemeState::Dark));
    }

    #[test]
    fn test_stream_source_parses_relevant_lines() {
        let output = "other-key: 'x'\ncolor-scheme: 'prefer-dark'\n";
        let parser = |line: &str| {
            line.starts_with("color-scheme")
                .then(|| ThemeState::from(line.to_lowercase().contains("dark")))
        };
        let mut source =
            StreamSource::spawn("test", Cursor::new(output), parser, Duration::from_secs(5), None).unwrap();
        let token = CancellationToken::new();

        assert_eq!(source.next_state(&token).unwrap(), None);
        assert_eq!(source.next_state(&token).unwrap(), Some(ThemeState::Dark));
        // End of stream is fatal.
        assert!(source.next_state(&token).is_err());
    }

    #[test]
    fn test_stream_source_drops_resource() {
        struct Resource(Arc<AtomicBool>);
        impl Drop for Resource {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let released = Arc::new(AtomicBool::new(false));
        let source = StreamSource::spawn(
            "test",
            Cursor::new(""),
            |_: &str| None,
            Duration::from_millis(5),
            Some(Box::new(Resource(released.clone()))),
        )
        .unwrap();

        drop(source);
        assert!(released.load(Ordering::SeqCst));
    }
}
