//! Reconnection backoff.

use std::time::Duration;

use crate::options::SocketOptions;

/// Tracks reconnection attempts and the delay before the next one.
///
/// Delays start at `reconnect_ivl` and double per attempt, capped at
/// `reconnect_ivl_max`. A zero cap keeps the delay fixed.
///
/// ```rust
/// use tessera_core::reconnect::ReconnectState;
/// use tessera_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let options = SocketOptions::default()
///     .with_reconnect_ivl(Duration::from_millis(100))
///     .with_reconnect_ivl_max(Duration::from_secs(10));
///
/// let mut reconnect = ReconnectState::new(&options);
/// assert_eq!(reconnect.next_delay(), Duration::from_millis(100));
/// assert_eq!(reconnect.next_delay(), Duration::from_millis(200));
///
/// reconnect.reset();
/// assert_eq!(reconnect.next_delay(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectState {
    base_interval: Duration,
    max_interval: Duration,
    attempt: u32,
}

impl ReconnectState {
    pub const fn new(options: &SocketOptions) -> Self {
        Self {
            base_interval: options.reconnect_ivl,
            max_interval: options.reconnect_ivl_max,
            attempt: 0,
        }
    }

    /// Delay to wait before the next attempt; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_interval();
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Reset after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of delays handed out since the last reset.
    #[inline]
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    #[inline]
    #[must_use]
    pub const fn base_interval(&self) -> Duration {
        self.base_interval
    }

    #[inline]
    #[must_use]
    pub const fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Delay the next call to [`next_delay`](Self::next_delay) will return.
    #[must_use]
    pub fn current_interval(&self) -> Duration {
        if self.max_interval.is_zero() {
            return self.base_interval;
        }
        // 2^16 already exceeds any sane cap; avoids overflow on long outages.
        let factor = 1_u32 << self.attempt.min(16);
        self.base_interval
            .saturating_mul(factor)
            .min(self.max_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let options = SocketOptions::default()
            .with_reconnect_ivl(Duration::from_millis(100))
            .with_reconnect_ivl_max(Duration::from_secs(10));

        let mut state = ReconnectState::new(&options);

        assert_eq!(state.next_delay(), Duration::from_millis(100));
        assert_eq!(state.next_delay(), Duration::from_millis(200));
        assert_eq!(state.next_delay(), Duration::from_millis(400));
        assert_eq!(state.next_delay(), Duration::from_millis(800));
        assert_eq!(state.attempt(), 4);
    }

    #[test]
    fn test_max_interval_cap() {
        let options = SocketOptions::default()
            .with_reconnect_ivl(Duration::from_millis(100))
            .with_reconnect_ivl_max(Duration::from_millis(500));

        let mut state = ReconnectState::new(&options);

        assert_eq!(state.next_delay(), Duration::from_millis(100));
        assert_eq!(state.next_delay(), Duration::from_millis(200));
        assert_eq!(state.next_delay(), Duration::from_millis(400));
        assert_eq!(state.next_delay(), Duration::from_millis(500));
        assert_eq!(state.next_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_max_keeps_base_interval() {
        let options = SocketOptions::default().with_reconnect_ivl(Duration::from_millis(50));
        let mut state = ReconnectState::new(&options);
        for _ in 0..5 {
            assert_eq!(state.next_delay(), Duration::from_millis(50));
        }
    }

    #[test]
    fn test_reset_and_long_outage() {
        let options = SocketOptions::default()
            .with_reconnect_ivl(Duration::from_millis(100))
            .with_reconnect_ivl_max(Duration::from_secs(30));

        let mut state = ReconnectState::new(&options);
        for _ in 0..100 {
            state.next_delay();
        }
        assert_eq!(state.current_interval(), Duration::from_secs(30));

        state.reset();
        assert_eq!(state.attempt(), 0);
        assert_eq!(state.next_delay(), Duration::from_millis(100));
    }
}
