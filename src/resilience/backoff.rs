//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// First delay after a transient accept failure.
pub const ACCEPT_BACKOFF_BASE_MS: u64 = 5;

/// Upper bound for the accept retry delay.
pub const ACCEPT_BACKOFF_MAX_MS: u64 = 1_000;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay before retrying accept after `attempt` consecutive transient failures.
pub fn accept_backoff(attempt: u32) -> Duration {
    calculate_backoff(attempt, ACCEPT_BACKOFF_BASE_MS, ACCEPT_BACKOFF_MAX_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
        assert!(max.as_millis() < 1100);
    }

    #[test]
    fn accept_backoff_is_bounded() {
        assert_eq!(accept_backoff(0), Duration::ZERO);
        assert!(accept_backoff(1).as_millis() >= 5);
        assert!(accept_backoff(64).as_millis() <= 1100);
    }
}
