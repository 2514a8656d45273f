use std::sync::Arc;
use std::time::Duration;

use hanlink_frame::{DeviceProfile, ProfileError, DEFAULT_ASSEMBLY_TIMEOUT};

use crate::watchdog::DEFAULT_WATCHDOG_TIMEOUT;

/// Errors raised when a [`PipelineConfig`] is unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Configuration for a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Framing and decoding rules of the meter.
    pub profile: Arc<DeviceProfile>,
    /// Time a partial frame may take to complete.
    pub assembly_timeout: Duration,
    /// Silence after which the source is closed and reopened.
    pub watchdog_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            profile: Arc::new(DeviceProfile::default()),
            assembly_timeout: DEFAULT_ASSEMBLY_TIMEOUT,
            watchdog_timeout: DEFAULT_WATCHDOG_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn with_profile(mut self, profile: DeviceProfile) -> Self {
        self.profile = Arc::new(profile);
        self
    }

    pub fn with_assembly_timeout(mut self, timeout: Duration) -> Self {
        self.assembly_timeout = timeout;
        self
    }

    pub fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assembly_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("assembly"));
        }
        if self.watchdog_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("watchdog"));
        }
        self.profile.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.assembly_timeout, Duration::from_secs(2));
        assert_eq!(config.watchdog_timeout, Duration::from_secs(11));
        config.validate().unwrap();
    }

    #[test]
    fn zero_timeouts_rejected() {
        let err = PipelineConfig::default()
            .with_watchdog_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "watchdog timeout must be greater than zero");

        let err = PipelineConfig::default()
            .with_assembly_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout("assembly")));
    }

    #[test]
    fn invalid_profile_rejected() {
        let profile = DeviceProfile {
            frame_length: 0,
            ..DeviceProfile::default()
        };
        let err = PipelineConfig::default()
            .with_profile(profile)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Profile(_)));
    }
}
