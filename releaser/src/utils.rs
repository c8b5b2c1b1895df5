//! Utility functions

use std::time::Duration;

/// Length of the uuid prefix shown to operators
pub const SHORT_UUID_LEN: usize = 6;

/// Backoff between retried reads
///
/// The delay doubles (by `multiplier`) with each attempt and never exceeds
/// `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryBackoff {
    pub initial: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2,
        }
    }
}

impl RetryBackoff {
    /// Delay before retry number `retry` (0 based)
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Shorten a device uuid for display
pub fn short_uuid(uuid: &str) -> &str {
    match uuid.char_indices().nth(SHORT_UUID_LEN) {
        Some((idx, _)) => &uuid[..idx],
        None => uuid,
    }
}

/// Quote a string literal for a pine `$filter` expression
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
