//! GNOME / GTK desktops.
//!
//! The theme is read with `gsettings get` on both the legacy `gtk-theme` key
//! and the newer `color-scheme` key; either one naming a dark theme counts.
//! Changes are observed by keeping `gsettings monitor` running and parsing
//! its output, one `key value` pair per line.

use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use theme_detector_core::{
    ChangeSource, DetectorConfig, DetectorError, DetectorKind, EstablishSource, MonitorError,
    MonitoredDetector, SampleError, StreamSource, ThemeSampler, ThemeState,
};

use crate::command::{ChildGuard, ThemeCommand};
use crate::pattern::{DarkThemePattern, compile};

/// Default monitor thread name.
pub const THREAD_NAME: &str = "GTK Theme Detector Thread";

/// Lines from `gsettings monitor` that carry a theme value.
pub const MONITOR_LINE_PATTERN: &str = "(?i)^(gtk-theme|color-scheme).*";

const GET_COMMANDS: [ThemeCommand; 2] = [
    ThemeCommand::new("gsettings", &["get", "org.gnome.desktop.interface", "gtk-theme"]),
    ThemeCommand::new("gsettings", &["get", "org.gnome.desktop.interface", "color-scheme"]),
];

const MONITOR_COMMAND: ThemeCommand =
    ThemeCommand::new("gsettings", &["monitor", "org.gnome.desktop.interface"]);

/// Samples the theme through `gsettings get`.
#[derive(Debug, Clone)]
pub struct GnomeSampler {
    dark: DarkThemePattern,
    timeout: Duration,
}

impl GnomeSampler {
    /// Create a sampler whose helper processes are killed after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DetectorError> {
        Ok(Self {
            dark: DarkThemePattern::new()?,
            timeout,
        })
    }
}

impl ThemeSampler for GnomeSampler {
    fn sample_is_dark(&self) -> Result<bool, SampleError> {
        for command in &GET_COMMANDS {
            match command.first_line(self.timeout) {
                Ok(Some(value)) if self.dark.is_dark(&value) => return Ok(true),
                Ok(_) => {}
                // Older GNOME releases have no color-scheme key.
                Err(err @ SampleError::CommandFailed { .. }) => {
                    tracing::debug!(target: "theme_detector::gnome", error = %err, "ignoring failed key query");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(false)
    }
}

/// Parses `gsettings monitor` output lines.
#[derive(Debug, Clone)]
pub struct MonitorLineParser {
    relevant: Regex,
    dark: DarkThemePattern,
}

impl MonitorLineParser {
    /// Compile the line patterns.
    pub fn new() -> Result<Self, DetectorError> {
        Ok(Self {
            relevant: compile(MONITOR_LINE_PATTERN)?,
            dark: DarkThemePattern::new()?,
        })
    }

    /// The theme state carried by `line`, or `None` for unrelated keys and
    /// lines without a value.
    pub fn parse(&self, line: &str) -> Option<ThemeState> {
        if !self.relevant.is_match(line) {
            return None;
        }
        let (_key, value) = line.split_once(char::is_whitespace)?;
        Some(ThemeState::from(self.dark.is_dark(value)))
    }
}

/// Create the GNOME detector.
pub fn create(config: &DetectorConfig) -> Result<MonitoredDetector, DetectorError> {
    let sampler: Arc<dyn ThemeSampler> = Arc::new(GnomeSampler::new(config.command_timeout)?);
    let parser = MonitorLineParser::new()?;
    let thread_name = config.thread_name_or(THREAD_NAME);
    let slice = config.stop_check_interval;

    let launch_name = thread_name.clone();
    Ok(MonitoredDetector::new(
        DetectorKind::Gnome,
        thread_name,
        sampler,
        Box::new(move || -> EstablishSource {
            let name = launch_name.clone();
            let parser = parser.clone();
            Box::new(move || establish_monitor(&name, parser, slice))
        }),
    ))
}

fn establish_monitor(
    name: &str,
    parser: MonitorLineParser,
    slice: Duration,
) -> Result<Box<dyn ChangeSource>, MonitorError> {
    let mut child = MONITOR_COMMAND
        .spawn()
        .map_err(|err| MonitorError::establish(format!("couldn't start monitoring process: {err}")))?;

    let Some(stdout) = child.stdout.take() else {
        drop(ChildGuard::new(child));
        return Err(MonitorError::establish("monitoring process has no output"));
    };

    let source = StreamSource::spawn(
        name,
        BufReader::new(stdout),
        move |line: &str| parser.parse(line),
        slice,
        Some(Box::new(ChildGuard::new(child))),
    )?;
    tracing::debug!(target: "theme_detector::gnome", command = %MONITOR_COMMAND.command_line(), "monitoring process started");
    Ok(Box::new(source))
}
