//! KDE Plasma desktops.
//!
//! `kreadconfig` has no monitoring mode, so the color scheme name is polled.

use std::sync::Arc;
use std::time::Duration;

use theme_detector_core::{
    ChangeSource, DetectorConfig, DetectorError, DetectorKind, EstablishSource, MonitoredDetector,
    PollingSource, SampleError, ThemeSampler,
};

use crate::command::ThemeCommand;
use crate::pattern::DarkThemePattern;

/// Default monitor thread name.
pub const THREAD_NAME: &str = "KDE Theme Detector Thread";

const READ_ARGS: &[&str] = &["--file", "kdeglobals", "--group", "General", "--key", "ColorScheme"];

/// Plasma 5 first, then Plasma 6.
const READ_COMMANDS: [ThemeCommand; 2] = [
    ThemeCommand::new("kreadconfig5", READ_ARGS),
    ThemeCommand::new("kreadconfig6", READ_ARGS),
];

/// Samples the color scheme name through `kreadconfig`.
#[derive(Debug, Clone)]
pub struct KdeSampler {
    dark: DarkThemePattern,
    timeout: Duration,
}

impl KdeSampler {
    /// Create a sampler whose helper process is killed after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DetectorError> {
        Ok(Self {
            dark: DarkThemePattern::new()?,
            timeout,
        })
    }

    fn read_color_scheme(&self) -> Result<Option<String>, SampleError> {
        let mut last_error = None;
        for command in &READ_COMMANDS {
            match command.first_line(self.timeout) {
                Err(err) if err.is_spawn_failure() => {
                    tracing::trace!(target: "theme_detector::kde", program = command.program(), "not installed");
                    last_error = Some(err);
                }
                result => return result,
            }
        }
        match last_error {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }
}

impl ThemeSampler for KdeSampler {
    fn sample_is_dark(&self) -> Result<bool, SampleError> {
        Ok(self
            .read_color_scheme()?
            .is_some_and(|scheme| self.dark.is_dark(&scheme)))
    }
}

/// Create the KDE detector.
pub fn create(config: &DetectorConfig) -> Result<MonitoredDetector, DetectorError> {
    let sampler: Arc<dyn ThemeSampler> = Arc::new(KdeSampler::new(config.command_timeout)?);
    let interval = config.poll_interval;

    let poll_sampler = sampler.clone();
    Ok(MonitoredDetector::new(
        DetectorKind::Kde,
        config.thread_name_or(THREAD_NAME),
        sampler,
        Box::new(move || -> EstablishSource {
            let sampler = poll_sampler.clone();
            Box::new(move || Ok(Box::new(PollingSource::new(sampler, interval)) as Box<dyn ChangeSource>))
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use theme_detector_core::ThemeDetector;

    #[test]
    fn test_read_command_line() {
        assert_eq!(
            READ_COMMANDS[0].command_line(),
            "kreadconfig5 --file kdeglobals --group General --key ColorScheme"
        );
        assert_eq!(READ_COMMANDS[1].program(), "kreadconfig6");
    }

    #[test]
    fn test_detector_shape() {
        let detector = create(&DetectorConfig::default()).unwrap();
        assert_eq!(detector.kind(), DetectorKind::Kde);
        assert_eq!(detector.thread_name(), THREAD_NAME);
        assert!(!detector.is_monitoring());
    }
}
