use std::time::Duration;

/// Bounded retry with linear backoff. The delay `base_delay + attempt * step`
/// is waited before every attempt, including the first, which keeps
/// back-to-back requests under the explorer's per-second limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub step: Duration,
}

impl RetryPolicy {
    /// `attempts` tries without any waiting.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
        }
    }

    /// Delay before the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay + self.step * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(600),
            step: Duration::from_millis(400),
        }
    }
}

#[test]
fn test_linear_backoff() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(0), Duration::from_millis(600));
    assert_eq!(policy.delay_for(1), Duration::from_millis(1_000));
    assert_eq!(policy.delay_for(2), Duration::from_millis(1_400));

    assert_eq!(RetryPolicy::immediate(5).delay_for(4), Duration::ZERO);
}
