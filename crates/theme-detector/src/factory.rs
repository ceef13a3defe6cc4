//! The process-wide detector.
//!
//! The first call to [`detector`] or [`init_detector`] probes the system,
//! picks a [`DetectorKind`] and builds the matching detector. Every later
//! call, from any thread, returns that same instance.

use std::sync::OnceLock;

use theme_detector_core::{
    DetectorConfig, DetectorError, DetectorKind, NoOpDetector, PlatformProbe, Result, ThemeDetector,
};

use crate::probe::SystemProbe;

/// Global detector instance.
static DETECTOR: OnceLock<Box<dyn ThemeDetector>> = OnceLock::new();

/// Get the process-wide detector, creating it with the default configuration
/// on first use.
///
/// Concurrent first calls create exactly one detector.
pub fn detector() -> &'static dyn ThemeDetector {
    DETECTOR
        .get_or_init(|| create_detector(&SystemProbe, &DetectorConfig::default()))
        .as_ref()
}

/// Create the process-wide detector with a custom configuration.
///
/// # Errors
///
/// Returns [`DetectorError::AlreadyInitialized`] if the detector already
/// exists, whether it was created by [`detector`] or an earlier call.
pub fn init_detector(config: DetectorConfig) -> Result<&'static dyn ThemeDetector> {
    let mut created = false;
    let instance = DETECTOR.get_or_init(|| {
        created = true;
        create_detector(&SystemProbe, &config)
    });

    if created {
        Ok(instance.as_ref())
    } else {
        Err(DetectorError::AlreadyInitialized)
    }
}

/// Get the process-wide detector if it has been created.
pub fn try_detector() -> Option<&'static dyn ThemeDetector> {
    DETECTOR.get().map(|detector| detector.as_ref())
}

/// Returns true if this system has a supported theme detector.
pub fn is_supported() -> bool {
    DetectorKind::select(&SystemProbe).is_supported()
}

/// Build a detector for whatever `probe` reports.
///
/// Never fails: anything that cannot be built falls back to the no-op
/// detector.
#[tracing::instrument(skip_all, target = "theme_detector::factory", level = "debug")]
pub fn create_detector(probe: &dyn PlatformProbe, config: &DetectorConfig) -> Box<dyn ThemeDetector> {
    let kind = DetectorKind::select(probe);
    if kind.is_supported() {
        tracing::debug!(target: "theme_detector::factory", "Supported Desktop detected: {kind}");
    } else {
        tracing::debug!(
            target: "theme_detector::factory",
            "Theme detection is not supported on the system: {} {}",
            probe.platform_family(),
            probe.os_version()
        );
    }

    match build(kind, config) {
        Ok(detector) => detector,
        Err(err) => {
            tracing::error!(target: "theme_detector::factory", %kind, error = %err, "couldn't create detector, falling back to no-op");
            Box::new(NoOpDetector)
        }
    }
}

fn build(kind: DetectorKind, config: &DetectorConfig) -> Result<Box<dyn ThemeDetector>> {
    tracing::debug!(target: "theme_detector::factory", "Creating {} detector...", kind);
    match kind {
        DetectorKind::Windows => build_windows(config),
        DetectorKind::Gnome => Ok(Box::new(crate::gnome::create(config)?)),
        DetectorKind::Kde => Ok(Box::new(crate::kde::create(config)?)),
        DetectorKind::MacOs => build_macos(config),
        DetectorKind::Unsupported => Ok(Box::new(NoOpDetector)),
    }
}

#[cfg(target_os = "windows")]
fn build_windows(config: &DetectorConfig) -> Result<Box<dyn ThemeDetector>> {
    Ok(Box::new(crate::windows::create(config)))
}

#[cfg(not(target_os = "windows"))]
fn build_windows(_config: &DetectorConfig) -> Result<Box<dyn ThemeDetector>> {
    tracing::warn!(target: "theme_detector::factory", "Windows detector is not available on this target");
    Ok(Box::new(NoOpDetector))
}

#[cfg(target_os = "macos")]
fn build_macos(config: &DetectorConfig) -> Result<Box<dyn ThemeDetector>> {
    Ok(Box::new(crate::macos::create(config)?))
}

#[cfg(not(target_os = "macos"))]
fn build_macos(_config: &DetectorConfig) -> Result<Box<dyn ThemeDetector>> {
    tracing::warn!(target: "theme_detector::factory", "macOS detector is not available on this target");
    Ok(Box::new(NoOpDetector))
}
