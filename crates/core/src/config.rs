//! Quota and cooldown configuration shared by all components.

use chrono::Duration;

/// Default number of generation actions a customer may consume before
/// entering cooldown.
pub const DEFAULT_QUOTA: u32 = 4;

/// Default cooldown in minutes before a customer's usage is auto-reset.
pub const DEFAULT_COOLDOWN_MINUTES: i64 = 60;

/// Quota and cooldown settings.
///
/// A single `LimitConfig` is constructed at process start and shared by the
/// [`crate::UsageLimiter`], [`crate::CooldownSweeper`], and
/// [`crate::QueueInspector`], so the threshold and readiness decisions of
/// all three always agree within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitConfig {
    /// Generation actions allowed per customer before cooldown.
    pub quota: u32,
    /// Wall-clock time a customer waits after hitting the quota.
    pub cooldown: Duration,
}

impl LimitConfig {
    /// Create a config with an explicit quota and cooldown.
    #[must_use]
    pub const fn new(quota: u32, cooldown: Duration) -> Self {
        Self { quota, cooldown }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            cooldown: Duration::minutes(DEFAULT_COOLDOWN_MINUTES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_observed_constants() {
        let config = LimitConfig::default();
        assert_eq!(config.quota, 4);
        assert_eq!(config.cooldown, Duration::hours(1));
    }
}
