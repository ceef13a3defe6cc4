//! Detects whether the operating system uses a dark or light theme, and
//! notifies listeners when that changes.
//!
//! Supported systems:
//!
//! - **Windows 10 and later**: registry change notifications
//! - **GNOME**: `gsettings monitor` output
//! - **KDE Plasma**: polling `kreadconfig5` / `kreadconfig6`
//! - **macOS 10.14 and later**: distributed notification observer
//!
//! On anything else the detector reports light and never notifies.
//!
//! # Example
//!
//! ```no_run
//! use theme_detector::{Listener, ThemeState};
//!
//! let detector = theme_detector::detector();
//! println!("dark: {}", detector.is_dark());
//!
//! let listener = Listener::new(|state: ThemeState| println!("theme changed to {state}"));
//! detector.register_listener(&listener);
//! // ...
//! detector.remove_listener(&listener);
//! ```
//!
//! Listeners are called on a background thread. A UI toolkit with a
//! main-thread requirement should forward the value to its own event loop.
//!
//! # Custom configuration
//!
//! ```no_run
//! use std::time::Duration;
//! use theme_detector::DetectorConfig;
//!
//! let config = DetectorConfig::new().poll_interval(Duration::from_secs(5));
//! let detector = theme_detector::init_detector(config).expect("first initialization");
//! let _subscription = detector.subscribe(|state| println!("now {state}"));
//! ```

mod command;
mod factory;
pub mod gnome;
pub mod kde;
#[cfg(target_os = "macos")]
pub mod macos;
mod pattern;
mod probe;
#[cfg(target_os = "windows")]
pub mod windows;

pub use command::{ChildGuard, ThemeCommand};
pub use factory::{create_detector, detector, init_detector, is_supported, try_detector};
pub use pattern::{DARK_THEME_PATTERN, DarkThemePattern};
pub use probe::{DESKTOP_ENV_VAR, SystemProbe};

pub use theme_detector_core::{
    DetectorConfig, DetectorError, DetectorKind, Listener, NoOpDetector, PlatformFamily,
    PlatformProbe, Result, Subscription, ThemeDetector, ThemeState, targets,
};
