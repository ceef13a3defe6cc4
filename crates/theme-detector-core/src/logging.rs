//! Logging facilities for theme detection.
//!
//! Theme detection uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     let detector = theme_detector::detector();
//!     println!("dark: {}", detector.is_dark());
//! }
//! ```
//!
//! Filter a single subsystem with the constants in [`targets`], for example
//! `RUST_LOG=theme_detector_core::monitor=debug`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core engine target.
    pub const CORE: &str = "theme_detector_core";
    /// Listener registry target.
    pub const REGISTRY: &str = "theme_detector_core::registry";
    /// Notification dispatch target.
    pub const DISPATCH: &str = "theme_detector_core::dispatch";
    /// Background monitor loop target.
    pub const MONITOR: &str = "theme_detector_core::monitor";
    /// Detector facade target.
    pub const DETECTOR: &str = "theme_detector_core::detector";
    /// Process-wide factory target.
    pub const FACTORY: &str = "theme_detector::factory";
    /// Helper process execution target.
    pub const COMMAND: &str = "theme_detector::command";
    /// Windows platform target.
    pub const WINDOWS: &str = "theme_detector::windows";
    /// GNOME platform target.
    pub const GNOME: &str = "theme_detector::gnome";
    /// KDE platform target.
    pub const KDE: &str = "theme_detector::kde";
    /// macOS platform target.
    pub const MACOS: &str = "theme_detector::macos";
}
