//! Platform facts and detector selection.
//!
//! Selection is a pure function of what a [`PlatformProbe`] reports, checked
//! in priority order: Windows 10 or later, GNOME, KDE, macOS 10.14 (Mojave)
//! or later, and finally the unsupported fallback.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ProbeError;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlatformFamily {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    MacOs,
    /// Linux (any distribution).
    Linux,
    /// Anything else, or unknown.
    #[default]
    Other,
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlatformFamily::Windows => "Windows",
            PlatformFamily::MacOs => "Mac OS X",
            PlatformFamily::Linux => "Linux",
            PlatformFamily::Other => "unknown",
        })
    }
}

/// Stateless facts about the running OS.
///
/// Implementations must not panic; failures resolve to
/// [`PlatformFamily::Other`] or an empty string.
pub trait PlatformProbe: Send + Sync {
    /// The OS family.
    fn platform_family(&self) -> PlatformFamily;

    /// The OS version as reported by the OS, e.g. `"10.0.19045"` or `"14.2"`.
    fn os_version(&self) -> String;

    /// The current desktop environment name, empty if unknown.
    fn current_desktop_environment(&self) -> String;
}

/// A dotted numeric OS version.
///
/// Missing trailing components compare as zero, so `10.14` equals `10.14.0`.
#[derive(Debug, Clone, Eq)]
pub struct OsVersion {
    components: Vec<u64>,
}

impl OsVersion {
    /// Build a version from numeric components.
    pub fn new(components: impl Into<Vec<u64>>) -> Self {
        Self {
            components: components.into(),
        }
    }

    /// The numeric components.
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Check if this version is at least `other`.
    pub fn is_at_least(&self, other: &OsVersion) -> bool {
        self >= other
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for OsVersion {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Tolerate suffixes such as "10.0.19045 Build" or "14.2-beta".
        let numeric = trimmed
            .split(|c: char| c.is_whitespace() || c == '-' || c == '+')
            .next()
            .unwrap_or("");

        if numeric.is_empty() {
            return Err(ProbeError::InvalidVersion(s.to_string()));
        }

        let components = numeric
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ProbeError::InvalidVersion(s.to_string()))?;

        Ok(Self { components })
    }
}

impl PartialEq for OsVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for OsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Which detector implementation fits the running system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    /// Windows 10 or later: registry change notifications.
    Windows,
    /// GNOME desktop: `gsettings monitor` output stream.
    Gnome,
    /// KDE desktop: polling `kreadconfig`.
    Kde,
    /// macOS 10.14 or later: distributed notification observer.
    MacOs,
    /// Nothing matched; the no-op detector.
    Unsupported,
}

impl DetectorKind {
    /// Pick the detector kind for the probed platform.
    ///
    /// Probe failures count as "no match" for the check they affect.
    pub fn select(probe: &dyn PlatformProbe) -> DetectorKind {
        let family = probe.platform_family();

        if family == PlatformFamily::Windows && version_at_least(probe, &[10]) {
            return DetectorKind::Windows;
        }

        if family == PlatformFamily::Linux {
            let desktop = probe.current_desktop_environment().to_lowercase();
            if desktop.contains("gnome") {
                return DetectorKind::Gnome;
            }
            if desktop.contains("kde") {
                return DetectorKind::Kde;
            }
        }

        if family == PlatformFamily::MacOs && version_at_least(probe, &[10, 14]) {
            return DetectorKind::MacOs;
        }

        DetectorKind::Unsupported
    }

    /// Returns true for every kind except [`DetectorKind::Unsupported`].
    pub fn is_supported(&self) -> bool {
        !matches!(self, DetectorKind::Unsupported)
    }

    /// Human readable desktop name for diagnostics.
    pub fn desktop_name(&self) -> &'static str {
        match self {
            DetectorKind::Windows => "Windows 10",
            DetectorKind::Gnome => "Gnome",
            DetectorKind::Kde => "KDE",
            DetectorKind::MacOs => "MacOS",
            DetectorKind::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.desktop_name())
    }
}

fn version_at_least(probe: &dyn PlatformProbe, minimum: &[u64]) -> bool {
    let reported = probe.os_version();
    match reported.parse::<OsVersion>() {
        Ok(version) => version.is_at_least(&OsVersion::new(minimum)),
        Err(err) => {
            tracing::debug!(target: "theme_detector_core", error = %err, "treating OS version as no match");
            false
        }
    }
}
