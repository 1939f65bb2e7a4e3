//! Reconnection policy for the live feed.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default delay before a reconnect attempt.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// Largest doubling applied by exponential backoff (2^16 times the interval).
const MAX_BACKOFF_SHIFT: u32 = 16;

/// How the delay grows between consecutive failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Backoff {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Double the delay per attempt, capped at `max`.
    Exponential {
        #[serde(with = "humantime_serde")]
        max: Duration,
    },
}

/// When, and whether, to reconnect after the socket closes.
///
/// The default reconnects forever every 3 seconds with no jitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Base delay before each attempt.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Growth strategy.
    pub backoff: Backoff,
    /// Consecutive failures allowed before giving up. `None` is unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            backoff: Backoff::Fixed,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Fixed interval, unbounded attempts.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Never reconnect: the first close leaves the client disconnected.
    pub fn never() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }

    /// Cap the number of consecutive attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Switch to exponential backoff capped at `max`.
    pub fn with_exponential_backoff(mut self, max: Duration) -> Self {
        self.backoff = Backoff::Exponential { max };
        self
    }

    /// Delay before reconnect number `attempt` (1-based), or `None` to stop.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt > max {
                return None;
            }
        }

        let delay = match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max } => {
                let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
                self.interval.saturating_mul(1 << shift).min(max)
            }
        };
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_three_seconds_forever() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_for(10_000), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_never_refuses_first_attempt() {
        let policy = RetryPolicy::never();
        assert_eq!(policy.delay_for(1), None);
    }

    #[test]
    fn test_max_attempts() {
        let policy = RetryPolicy::fixed(Duration::from_millis(100)).with_max_attempts(2);
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay_for(3), None);
    }

    #[test]
    fn test_exponential_backoff_caps() {
        let policy = RetryPolicy::fixed(Duration::from_secs(1))
            .with_exponential_backoff(Duration::from_secs(10));
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay_for(5), Some(Duration::from_secs(10)));
        assert_eq!(policy.delay_for(u32::MAX), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_deserialize_humantime() {
        let policy: RetryPolicy = serde_json::from_str(
            r#"{"interval": "500ms", "backoff": {"kind": "exponential", "max": "30s"}, "max_attempts": 5}"#,
        )
        .unwrap();
        assert_eq!(policy.interval, Duration::from_millis(500));
        assert_eq!(
            policy.backoff,
            Backoff::Exponential {
                max: Duration::from_secs(30)
            }
        );
        assert_eq!(policy.max_attempts, Some(5));

        let defaulted: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, RetryPolicy::default());
    }
}
