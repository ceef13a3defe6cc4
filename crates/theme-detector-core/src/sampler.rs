//! One-shot theme queries.

use crate::error::SampleError;
use crate::theme::ThemeState;

/// Reads the current theme state right now.
///
/// Implementations may spawn a process, read the registry or call into
/// native code. They must finish in bounded time under normal conditions.
pub trait ThemeSampler: Send + Sync {
    /// Return `true` if the OS currently uses a dark theme.
    fn sample_is_dark(&self) -> Result<bool, SampleError>;

    /// Sample the theme, logging failures and collapsing them to light.
    fn sample_or_light(&self) -> ThemeState {
        match self.sample_is_dark() {
            Ok(is_dark) => ThemeState::from(is_dark),
            Err(err) => {
                tracing::error!(target: "theme_detector_core::detector", error = %err, "couldn't detect OS theme");
                ThemeState::Light
            }
        }
    }
}

impl<F> ThemeSampler for F
where
    F: Fn() -> Result<bool, SampleError> + Send + Sync,
{
    fn sample_is_dark(&self) -> Result<bool, SampleError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sampler() {
        let sampler = || -> Result<bool, SampleError> { Ok(true) };
        assert_eq!(sampler.sample_or_light(), ThemeState::Dark);
    }

    #[test]
    fn test_failed_sample_is_light() {
        let sampler = || -> Result<bool, SampleError> { Err(SampleError::Native("no defaults".into())) };
        assert_eq!(sampler.sample_or_light(), ThemeState::Light);
    }
}
