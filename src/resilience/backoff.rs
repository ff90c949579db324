//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate exponential backoff delay with jitter, bounded by `[min_ms, max_ms]`.
///
/// `attempt` is 1-based: the delay after the first failed attempt is `min_ms`.
pub fn calculate_backoff(attempt: u32, min_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = min_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay.saturating_add(jitter).clamp(min_ms.min(max_ms), max_ms))
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
        assert_eq!(max.as_millis(), 1000);
    }

    #[test]
    fn test_backoff_never_below_min() {
        for attempt in 1..8 {
            let delay = calculate_backoff(attempt, 5000, 10000);
            assert!(delay.as_millis() >= 5000);
            assert!(delay.as_millis() <= 10000);
        }
    }

    #[test]
    fn test_zeroth_attempt_is_immediate() {
        assert_eq!(calculate_backoff(0, 100, 1000), Duration::ZERO);
    }
}
