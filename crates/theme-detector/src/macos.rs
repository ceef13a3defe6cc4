//! macOS 10.14 (Mojave) and later.
//!
//! The theme is the `AppleInterfaceStyle` user default, which is only present
//! (as "Dark") in dark mode. Changes are announced through the distributed
//! notification center; the observer block only posts to the detector's
//! event executor.
//!
//! Distributed notifications are delivered through the main run loop, so an
//! application without one gets correct one-shot queries but no change
//! notifications.

use std::ptr::NonNull;
use std::sync::Arc;

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::{NSObjectProtocol, ProtocolObject};
use objc2_foundation::{
    NSDistributedNotificationCenter, NSNotification, NSProcessInfo, NSString, NSUserDefaults,
};
use theme_detector_core::{
    DetectorConfig, DetectorError, DetectorKind, EventSender, MonitorError, ObserverDetector,
    SampleError, ThemeSampler,
};

use crate::pattern::DarkThemePattern;

/// Default executor thread name.
pub const THREAD_NAME: &str = "MacOS Theme Detector Thread";

const INTERFACE_STYLE_KEY: &str = "AppleInterfaceStyle";
const THEME_CHANGED_NOTIFICATION: &str = "AppleInterfaceThemeChangedNotification";

/// The macOS version as `major.minor.patch`.
pub fn os_version() -> String {
    let version = unsafe { NSProcessInfo::processInfo().operatingSystemVersion() };
    format!(
        "{}.{}.{}",
        version.majorVersion, version.minorVersion, version.patchVersion
    )
}

/// Samples `AppleInterfaceStyle` from the standard user defaults.
#[derive(Debug, Clone)]
pub struct MacOsSampler {
    dark: DarkThemePattern,
}

impl MacOsSampler {
    /// Create the sampler.
    pub fn new() -> Result<Self, DetectorError> {
        Ok(Self {
            dark: DarkThemePattern::new()?,
        })
    }
}

impl ThemeSampler for MacOsSampler {
    fn sample_is_dark(&self) -> Result<bool, SampleError> {
        let key = NSString::from_str(INTERFACE_STYLE_KEY);
        let style = unsafe { NSUserDefaults::standardUserDefaults().stringForKey(&key) };
        Ok(style.is_some_and(|style| self.dark.is_dark(&style.to_string())))
    }
}

fn install_observer(events: EventSender) -> Result<(), MonitorError> {
    let center = unsafe { NSDistributedNotificationCenter::defaultCenter() };
    let name = NSString::from_str(THEME_CHANGED_NOTIFICATION);

    let block = RcBlock::new(move |_notification: NonNull<NSNotification>| {
        if !events.notify() {
            tracing::warn!(target: "theme_detector::macos", "theme change dropped, executor has exited");
        }
    });

    // The center keeps the observer for the rest of the process.
    let _observer: Retained<ProtocolObject<dyn NSObjectProtocol>> =
        unsafe { center.addObserverForName_object_queue_usingBlock(Some(&name), None, None, &block) };
    tracing::debug!(target: "theme_detector::macos", notification = THEME_CHANGED_NOTIFICATION, "observer installed");
    Ok(())
}

/// Create the macOS detector.
pub fn create(config: &DetectorConfig) -> Result<ObserverDetector, DetectorError> {
    let sampler: Arc<dyn ThemeSampler> = Arc::new(MacOsSampler::new()?);
    Ok(ObserverDetector::new(
        DetectorKind::MacOs,
        config.thread_name_or(THREAD_NAME),
        sampler,
        install_observer,
    ))
}
