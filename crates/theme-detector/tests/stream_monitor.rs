//! Stream-driven monitoring against a real helper process.

#![cfg(target_os = "linux")]

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use theme_detector::gnome::MonitorLineParser;
use theme_detector::{ChildGuard, ThemeCommand};
use theme_detector_core::{
    ChangeSource, EstablishSource, Listener, ListenerRegistry, MonitorError, MonitorLoop,
    NotificationDispatcher, StreamSource, ThemeState,
};

const CHATTY_MONITOR: ThemeCommand = ThemeCommand::new(
    "sh",
    &["-c", "while :; do echo \"color-scheme: 'prefer-dark'\"; sleep 0.05; done"],
);

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
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

fn process_exists(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[test]
fn test_stopping_stream_monitor_kills_helper_process() {
    init_logging();
    let mut child = CHATTY_MONITOR.spawn().unwrap();
    let pid = child.id();
    let stdout = child.stdout.take().unwrap();
    let guard = ChildGuard::new(child);
    assert!(process_exists(pid));

    let parser = MonitorLineParser::new().unwrap();
    let establish: EstablishSource = Box::new(move || -> Result<Box<dyn ChangeSource>, MonitorError> {
        let source = StreamSource::spawn(
            "Chatty Monitor",
            BufReader::new(stdout),
            move |line: &str| parser.parse(line),
            Duration::from_millis(10),
            Some(Box::new(guard)),
        )?;
        Ok(Box::new(source))
    });

    let registry = Arc::new(ListenerRegistry::new());
    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    registry.add(&Listener::new(move |state| received_clone.lock().push(state)));

    let handle = MonitorLoop::spawn(
        "Chatty Monitor",
        ThemeState::Light,
        establish,
        NotificationDispatcher::new(registry),
    )
    .unwrap();

    // Repeated lines only produce the one transition.
    assert!(wait_until(|| !received.lock().is_empty()));
    thread::sleep(Duration::from_millis(150));
    assert_eq!(*received.lock(), vec![ThemeState::Dark]);

    handle.stop();
    assert!(wait_until(|| !handle.is_alive()));
    assert!(!handle.is_dead());
    assert!(wait_until(|| !process_exists(pid)), "helper process {pid} survived the stop");
}
