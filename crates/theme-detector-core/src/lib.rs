//! Core engine for OS theme detection.
//!
//! This crate holds everything that does not touch a specific operating
//! system:
//!
//! - **Theme state**: [`ThemeState`], the light/dark value delivered to listeners
//! - **Listener registry**: identity-based, thread-safe [`ListenerRegistry`]
//! - **Dispatch**: [`NotificationDispatcher`], which isolates failing listeners
//! - **Monitor loops**: [`MonitorLoop`] with polling, notification and stream sources
//! - **Event executor**: [`EventExecutor`] for callback-driven platforms
//! - **Detectors**: the [`ThemeDetector`] facade and its three lifecycles
//! - **Selection**: [`DetectorKind::select`] over a [`PlatformProbe`]
//!
//! Platform samplers and the process-wide factory live in the
//! `theme-detector` crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use theme_detector_core::{
//!     ChangeSource, DetectorKind, EstablishSource, MonitoredDetector, PollingSource, SampleError,
//!     ThemeDetector, ThemeSampler,
//! };
//!
//! let sampler: Arc<dyn ThemeSampler> = Arc::new(|| -> Result<bool, SampleError> { Ok(false) });
//! let poll_sampler = sampler.clone();
//! let detector = MonitoredDetector::new(
//!     DetectorKind::Kde,
//!     "Example Theme Detector Thread",
//!     sampler,
//!     Box::new(move || -> EstablishSource {
//!         let sampler = poll_sampler.clone();
//!         Box::new(move || {
//!             Ok(Box::new(PollingSource::new(sampler, Duration::from_millis(50))) as Box<dyn ChangeSource>)
//!         })
//!     }),
//! );
//!
//! assert!(!detector.is_dark());
//!
//! let detector: &dyn ThemeDetector = &detector;
//! let subscription = detector.subscribe(|state| println!("theme is now {state}"));
//! assert!(detector.is_monitoring());
//! drop(subscription);
//! assert!(!detector.is_monitoring());
//! ```

mod cancel;
mod config;
mod detector;
mod dispatch;
mod error;
mod executor;
pub mod logging;
pub mod monitor;
mod probe;
mod registry;
mod sampler;
mod theme;

pub use cancel::CancellationToken;
pub use config::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_STOP_CHECK_INTERVAL, DetectorConfig,
};
pub use detector::{
    MonitoredDetector, NoOpDetector, ObserverDetector, SourceLauncher, Subscription, ThemeDetector,
};
pub use dispatch::{DispatchReport, NotificationDispatcher};
pub use error::{
    DetectorError, ListenerError, MonitorError, ProbeError, Result, SampleError,
};
pub use executor::{EventExecutor, EventSender};
pub use logging::targets;
pub use monitor::{
    ChangeSource, ChangeWait, EstablishSource, MonitorHandle, MonitorLoop, NotificationSource,
    PollingSource, StreamSource,
};
pub use probe::{DetectorKind, OsVersion, PlatformFamily, PlatformProbe};
pub use registry::{Listener, ListenerRegistry};
pub use sampler::ThemeSampler;
pub use theme::ThemeState;
