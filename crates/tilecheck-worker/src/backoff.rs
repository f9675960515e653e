//! Retry backoff for transient failures.

use std::time::Duration;

/// Delay before a failed job becomes claimable again:
/// `min(cap, 2^attempts)` seconds.
pub fn retry_delay(attempts: u32, cap_secs: u64) -> Duration {
    let exp = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);
    Duration::from_secs(exp.min(cap_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_cap() {
        assert_eq!(retry_delay(0, 300), Duration::from_secs(1));
        assert_eq!(retry_delay(1, 300), Duration::from_secs(2));
        assert_eq!(retry_delay(5, 300), Duration::from_secs(32));
        assert_eq!(retry_delay(9, 300), Duration::from_secs(300));
    }

    #[test]
    fn huge_attempt_counts_do_not_overflow() {
        assert_eq!(retry_delay(64, 60), Duration::from_secs(60));
        assert_eq!(retry_delay(u32::MAX, 60), Duration::from_secs(60));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_exceeds_cap_and_is_monotonic(attempts in 0u32..80, cap in 1u64..100_000) {
                let d = retry_delay(attempts, cap);
                prop_assert!(d <= Duration::from_secs(cap));
                prop_assert!(retry_delay(attempts + 1, cap) >= d);
            }
        }
    }
}
