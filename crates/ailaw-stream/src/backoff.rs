use std::time::Duration;

use ailaw_core::config::StreamConfig;

/// Exponential reconnect schedule: `base * 2^attempts`, capped, for at most
/// `max_attempts` tries.
///
/// With the defaults: 1 s → 2 s → 4 s → 8 s → 16 s, then give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub max: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn from_config(cfg: &StreamConfig) -> Self {
        Self {
            base: Duration::from_millis(cfg.reconnect_base_ms),
            max: Duration::from_millis(cfg.reconnect_max_ms),
            max_attempts: cfg.max_reconnect_attempts,
        }
    }

    /// Delay before the retry that follows `attempts` failed tries.
    pub fn delay(&self, attempts: u32) -> Duration {
        // 2^31 already overflows any sane base; clamp the shift.
        let factor = 1u32.checked_shl(attempts.min(31)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn can_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&StreamConfig::default())
    }
}
