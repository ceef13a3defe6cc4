//! Facts about the running system.

use theme_detector_core::{PlatformFamily, PlatformProbe};

/// Environment variable naming the current desktop environment.
pub const DESKTOP_ENV_VAR: &str = "XDG_CURRENT_DESKTOP";

/// Probes the real operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl PlatformProbe for SystemProbe {
    fn platform_family(&self) -> PlatformFamily {
        if cfg!(target_os = "windows") {
            PlatformFamily::Windows
        } else if cfg!(target_os = "macos") {
            PlatformFamily::MacOs
        } else if cfg!(target_os = "linux") {
            PlatformFamily::Linux
        } else {
            PlatformFamily::Other
        }
    }

    fn os_version(&self) -> String {
        native_os_version()
    }

    fn current_desktop_environment(&self) -> String {
        std::env::var(DESKTOP_ENV_VAR).unwrap_or_default()
    }
}

static_assertions::assert_impl_all!(SystemProbe: Send, Sync);

#[cfg(target_os = "windows")]
fn native_os_version() -> String {
    crate::windows::os_version()
}

#[cfg(target_os = "macos")]
fn native_os_version() -> String {
    crate::macos::os_version()
}

#[cfg(target_os = "linux")]
fn native_os_version() -> String {
    // Kernel release, e.g. "6.8.0-45-generic".
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|release| release.trim().to_string())
        .unwrap_or_default()
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn native_os_version() -> String {
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_probe() {
        let probe = SystemProbe;
        assert_eq!(probe.platform_family(), PlatformFamily::Linux);
        assert!(!probe.os_version().is_empty());
    }
}
