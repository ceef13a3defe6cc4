//! Theme name matching.

use regex::Regex;
use theme_detector_core::DetectorError;

/// A theme name is dark if it contains "dark" anywhere, ignoring case.
pub const DARK_THEME_PATTERN: &str = "(?i)^.*dark.*$";

/// Matches theme names against [`DARK_THEME_PATTERN`].
#[derive(Debug, Clone)]
pub struct DarkThemePattern {
    regex: Regex,
}

impl DarkThemePattern {
    /// Compile the pattern.
    pub fn new() -> Result<Self, DetectorError> {
        Ok(Self {
            regex: compile(DARK_THEME_PATTERN)?,
        })
    }

    /// Returns true if `name` is a dark theme name.
    pub fn is_dark(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, DetectorError> {
    Regex::new(pattern).map_err(|err| DetectorError::InvalidPattern(err.to_string()))
}
