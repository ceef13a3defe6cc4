//! Windows 10 and later.
//!
//! The theme is the `AppsUseLightTheme` value of the per-user personalization
//! key. Changes are observed with `RegNotifyChangeKeyValue`, which signals an
//! event handle that the monitor thread waits on.

use std::ffi::c_void;
use std::sync::Arc;
use std::time::Duration;

use theme_detector_core::{
    ChangeSource, ChangeWait, DetectorConfig, DetectorKind, EstablishSource, MonitorError,
    MonitoredDetector, NotificationSource, SampleError, ThemeSampler,
};
use windows::Win32::Foundation::{
    BOOL, CloseHandle, ERROR_SUCCESS, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT, WIN32_ERROR,
};
use windows::Win32::System::Registry::{
    HKEY, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_NOTIFY, KEY_READ, REG_NOTIFY_CHANGE_LAST_SET,
    RRF_RT_REG_DWORD, RRF_RT_REG_SZ, RegCloseKey, RegGetValueW, RegNotifyChangeKeyValue,
    RegOpenKeyExW,
};
use windows::Win32::System::Threading::{CreateEventW, WaitForSingleObject};
use windows::core::{PCWSTR, w};

/// Default monitor thread name.
pub const THREAD_NAME: &str = "Windows 10 Theme Detector Thread";

const PERSONALIZE_KEY: PCWSTR = w!("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize");
const LIGHT_THEME_VALUE: PCWSTR = w!("AppsUseLightTheme");
const CURRENT_VERSION_KEY: PCWSTR = w!("SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion");

fn read_dword(root: HKEY, subkey: PCWSTR, value: PCWSTR) -> Result<u32, WIN32_ERROR> {
    let mut data: u32 = 0;
    let mut size = std::mem::size_of::<u32>() as u32;
    let status = unsafe {
        RegGetValueW(
            root,
            subkey,
            value,
            RRF_RT_REG_DWORD,
            None,
            Some((&mut data as *mut u32).cast::<c_void>()),
            Some(&mut size),
        )
    };
    if status == ERROR_SUCCESS {
        Ok(data)
    } else {
        Err(status)
    }
}

fn read_string(root: HKEY, subkey: PCWSTR, value: PCWSTR) -> Result<String, WIN32_ERROR> {
    let mut buffer = [0u16; 128];
    let mut size = std::mem::size_of_val(&buffer) as u32;
    let status = unsafe {
        RegGetValueW(
            root,
            subkey,
            value,
            RRF_RT_REG_SZ,
            None,
            Some(buffer.as_mut_ptr().cast::<c_void>()),
            Some(&mut size),
        )
    };
    if status != ERROR_SUCCESS {
        return Err(status);
    }
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    Ok(String::from_utf16_lossy(&buffer[..len]))
}

/// The Windows version as `major.minor[.build]`, empty if unreadable.
pub fn os_version() -> String {
    let major = read_dword(HKEY_LOCAL_MACHINE, CURRENT_VERSION_KEY, w!("CurrentMajorVersionNumber"));
    let minor = read_dword(HKEY_LOCAL_MACHINE, CURRENT_VERSION_KEY, w!("CurrentMinorVersionNumber"));
    if let (Ok(major), Ok(minor)) = (major, minor) {
        return match read_string(HKEY_LOCAL_MACHINE, CURRENT_VERSION_KEY, w!("CurrentBuildNumber")) {
            Ok(build) => format!("{major}.{minor}.{build}"),
            Err(_) => format!("{major}.{minor}"),
        };
    }

    // Releases before Windows 10 only carry the legacy string value.
    read_string(HKEY_LOCAL_MACHINE, CURRENT_VERSION_KEY, w!("CurrentVersion")).unwrap_or_else(|status| {
        tracing::debug!(target: "theme_detector::windows", ?status, "couldn't read Windows version");
        String::new()
    })
}

/// Samples `AppsUseLightTheme`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsSampler;

impl ThemeSampler for WindowsSampler {
    fn sample_is_dark(&self) -> Result<bool, SampleError> {
        // A missing value means the OS predates the setting: light.
        Ok(read_dword(HKEY_CURRENT_USER, PERSONALIZE_KEY, LIGHT_THEME_VALUE) == Ok(0))
    }
}

/// Waits for writes to the personalization key.
///
/// Owns the open key and the event handle; both are closed on drop.
pub struct RegistryWait {
    key: HKEY,
    event: HANDLE,
}

// The key and event handles are process-wide kernel handles, usable from any thread.
unsafe impl Send for RegistryWait {}

impl RegistryWait {
    /// Open the key and arm the first notification.
    pub fn open() -> Result<Self, MonitorError> {
        let mut key = HKEY::default();
        let status = unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, PERSONALIZE_KEY, 0, KEY_NOTIFY | KEY_READ, &mut key) };
        if status != ERROR_SUCCESS {
            return Err(MonitorError::establish(format!("couldn't open personalization key: {status:?}")));
        }

        let event = match unsafe { CreateEventW(None, BOOL::from(false), BOOL::from(false), PCWSTR::null()) } {
            Ok(event) => event,
            Err(err) => {
                unsafe {
                    let _ = RegCloseKey(key);
                }
                return Err(MonitorError::establish(format!("couldn't create change event: {err}")));
            }
        };

        let wait = Self { key, event };
        wait.arm().map_err(|err| MonitorError::establish(err.to_string()))?;
        Ok(wait)
    }

    fn arm(&self) -> Result<(), MonitorError> {
        let status = unsafe {
            RegNotifyChangeKeyValue(
                self.key,
                BOOL::from(false),
                REG_NOTIFY_CHANGE_LAST_SET,
                self.event,
                BOOL::from(true),
            )
        };
        if status == ERROR_SUCCESS {
            Ok(())
        } else {
            Err(MonitorError::native(format!("RegNotifyChangeKeyValue failed: {status:?}")))
        }
    }
}

/// Milliseconds for a bounded wait. `u32::MAX` is `INFINITE`, so never pass it.
fn wait_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).map_or(u32::MAX - 1, |millis| millis.min(u32::MAX - 1))
}

impl ChangeWait for RegistryWait {
    fn wait_for_change(&mut self, timeout: Duration) -> Result<bool, MonitorError> {
        let result = unsafe { WaitForSingleObject(self.event, wait_millis(timeout)) };
        if result == WAIT_OBJECT_0 {
            // Notifications are one-shot.
            self.arm()?;
            Ok(true)
        } else if result == WAIT_TIMEOUT {
            Ok(false)
        } else {
            Err(MonitorError::native(format!("WaitForSingleObject returned {result:?}")))
        }
    }
}

impl Drop for RegistryWait {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.key);
            let _ = CloseHandle(self.event);
        }
        tracing::debug!(target: "theme_detector::windows", "registry notification handles closed");
    }
}

/// Create the Windows detector.
pub fn create(config: &DetectorConfig) -> MonitoredDetector {
    let sampler: Arc<dyn ThemeSampler> = Arc::new(WindowsSampler);
    let slice = config.stop_check_interval;

    let wait_sampler = sampler.clone();
    MonitoredDetector::new(
        DetectorKind::Windows,
        config.thread_name_or(THREAD_NAME),
        sampler,
        Box::new(move || -> EstablishSource {
            let sampler = wait_sampler.clone();
            Box::new(move || {
                let wait = RegistryWait::open()?;
                Ok(Box::new(NotificationSource::new(wait, sampler, slice)) as Box<dyn ChangeSource>)
            })
        }),
    )
}
