//! Integration tests for detector selection and the process-wide instance.

use std::sync::{Arc, Barrier};
use std::thread;

use theme_detector::{
    DetectorConfig, DetectorError, DetectorKind, Listener, PlatformFamily, PlatformProbe,
    ThemeDetector, create_detector, detector, init_detector, try_detector,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct FakeProbe {
    family: PlatformFamily,
    version: &'static str,
    desktop: &'static str,
}

impl PlatformProbe for FakeProbe {
    fn platform_family(&self) -> PlatformFamily {
        self.family
    }

    fn os_version(&self) -> String {
        self.version.to_string()
    }

    fn current_desktop_environment(&self) -> String {
        self.desktop.to_string()
    }
}

fn created_kind(family: PlatformFamily, version: &'static str, desktop: &'static str) -> DetectorKind {
    let probe = FakeProbe {
        family,
        version,
        desktop,
    };
    create_detector(&probe, &DetectorConfig::default()).kind()
}

fn address(detector: &dyn ThemeDetector) -> usize {
    detector as *const dyn ThemeDetector as *const () as usize
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_unsupported_system_gets_noop() {
    init_logging();
    let probe = FakeProbe {
        family: PlatformFamily::Other,
        version: "1.0",
        desktop: "",
    };
    let detector = create_detector(&probe, &DetectorConfig::default());

    assert_eq!(detector.kind(), DetectorKind::Unsupported);
    assert!(!detector.is_dark());

    let listener = Listener::new(|_| panic!("never called"));
    detector.register_listener(&listener);
    assert_eq!(detector.listener_count(), 0);
    assert!(!detector.is_monitoring());
}

#[test]
fn test_linux_desktops() {
    init_logging();
    assert_eq!(created_kind(PlatformFamily::Linux, "6.8.0", "ubuntu:GNOME"), DetectorKind::Gnome);
    assert_eq!(created_kind(PlatformFamily::Linux, "6.8.0", "KDE"), DetectorKind::Kde);
    assert_eq!(created_kind(PlatformFamily::Linux, "6.8.0", "XFCE"), DetectorKind::Unsupported);
}

#[test]
fn test_created_detector_is_idle_without_listeners() {
    init_logging();
    let probe = FakeProbe {
        family: PlatformFamily::Linux,
        version: "6.8.0",
        desktop: "KDE",
    };
    let detector = create_detector(&probe, &DetectorConfig::default());
    assert!(!detector.is_monitoring());
    assert_eq!(detector.listener_count(), 0);
}

#[cfg(not(target_os = "windows"))]
#[test]
fn test_windows_kind_off_target_falls_back() {
    init_logging();
    assert_eq!(created_kind(PlatformFamily::Windows, "10.0.19045", ""), DetectorKind::Unsupported);
}

#[cfg(not(target_os = "macos"))]
#[test]
fn test_macos_kind_off_target_falls_back() {
    init_logging();
    assert_eq!(created_kind(PlatformFamily::MacOs, "14.2", ""), DetectorKind::Unsupported);
}

#[test]
fn test_old_versions_unsupported() {
    init_logging();
    assert_eq!(created_kind(PlatformFamily::Windows, "6.3", ""), DetectorKind::Unsupported);
    assert_eq!(created_kind(PlatformFamily::MacOs, "10.13.6", ""), DetectorKind::Unsupported);
}

// ============================================================================
// Process-wide instance
// ============================================================================

#[test]
fn test_concurrent_first_access_yields_one_instance() {
    init_logging();
    let threads = 50;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                address(detector())
            })
        })
        .collect();

    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(addresses.iter().all(|&a| a == addresses[0]));
    assert_eq!(address(detector()), addresses[0]);
}

#[test]
fn test_init_after_creation_fails() {
    init_logging();
    let instance = detector();
    assert!(matches!(
        init_detector(DetectorConfig::default()),
        Err(DetectorError::AlreadyInitialized)
    ));
    let existing = try_detector().unwrap();
    assert_eq!(address(existing), address(instance));
}
