//! The observable theme state.

use std::fmt;

/// Whether the OS is currently using a dark or a light UI theme.
///
/// Unknown or unsupported platforms report [`ThemeState::Light`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeState {
    /// Light theme (dark text on light background).
    #[default]
    Light,
    /// Dark theme (light text on dark background).
    Dark,
}

impl ThemeState {
    /// Returns true if this is the dark theme.
    pub fn is_dark(&self) -> bool {
        matches!(self, ThemeState::Dark)
    }

    /// Returns true if this is the light theme.
    pub fn is_light(&self) -> bool {
        matches!(self, ThemeState::Light)
    }
}

impl From<bool> for ThemeState {
    fn from(is_dark: bool) -> Self {
        if is_dark { Self::Dark } else { Self::Light }
    }
}

impl From<ThemeState> for bool {
    fn from(state: ThemeState) -> Self {
        state.is_dark()
    }
}

impl fmt::Display for ThemeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_light() {
        assert_eq!(ThemeState::default(), ThemeState::Light);
    }

    #[test]
    fn test_bool_conversions() {
        assert_eq!(ThemeState::from(true), ThemeState::Dark);
        assert_eq!(ThemeState::from(false), ThemeState::Light);
        assert!(bool::from(ThemeState::Dark));
        assert!(ThemeState::Light.is_light());
        assert!(!ThemeState::Light.is_dark());
    }

    #[test]
    fn test_display() {
        assert_eq!(ThemeState::Dark.to_string(), "dark");
        assert_eq!(ThemeState::Light.to_string(), "light");
    }
}
