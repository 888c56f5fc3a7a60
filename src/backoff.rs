use std::{cmp::min, time::Duration};

use crate::config::SubscriptionConfig;

const EXP_BASE: u32 = 2;

/// Exponential backoff durations starting at `initial` and capped at `max`,
/// suitable for passing to `tokio::time::sleep`.
pub fn iter(initial: Duration, max: Duration) -> impl Iterator<Item = Duration> {
    debug_assert!(initial <= max);

    (0u32..).map(move |index| {
        let factor = EXP_BASE.saturating_pow(index);
        let wait = initial.saturating_mul(factor);
        min(wait, max)
    })
}

pub fn for_subscription(cfg: &SubscriptionConfig) -> impl Iterator<Item = Duration> {
    iter(cfg.initial_backoff, cfg.max_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_caps() {
        let got: Vec<_> = iter(Duration::from_millis(250), Duration::from_secs(1))
            .take(5)
            .collect();
        assert_eq!(
            got,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ]
        );
    }

    #[test]
    fn no_integer_overflow() {
        let mut durations = for_subscription(&SubscriptionConfig::default());
        for _ in 0..200 {
            assert!(durations.next().is_some_and(|d| d <= Duration::from_secs(32)));
        }
    }
}
