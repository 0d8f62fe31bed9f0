//! Wait Mechanisms
//!
//! One async polling primitive, [`poll_until`], backs every readiness wait
//! and every assertion. A probe is evaluated immediately, then every poll
//! interval, and once more at the deadline. The last observation is kept so
//! a timeout can say what the page looked like when time ran out.
//!
//! Timing goes through `tokio::time`, so tests can run on paused time.

use crate::config::{Timeouts, DEFAULT_POLL_INTERVAL_MS};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: crate::config::DEFAULT_ACTION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Action-class wait derived from suite timeouts
    #[must_use]
    pub const fn action(timeouts: &Timeouts) -> Self {
        Self {
            timeout_ms: timeouts.action_ms,
            poll_interval_ms: timeouts.poll_interval_ms,
        }
    }

    /// Navigation-class wait derived from suite timeouts
    #[must_use]
    pub const fn navigation(timeouts: &Timeouts) -> Self {
        Self {
            timeout_ms: timeouts.navigation_ms,
            poll_interval_ms: timeouts.poll_interval_ms,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T, O> {
    /// Condition holds; stop polling
    Ready(T),
    /// Condition does not hold yet; keep the observation for diagnostics
    Pending(O),
}

/// Deadline passed without the condition holding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitTimeout<O> {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probes evaluated
    pub attempts: u32,
    /// Observation from the final probe
    pub last: Option<O>,
}

/// Poll `probe` until it reports [`Probe::Ready`] or the timeout elapses.
///
/// The probe always runs at least once, even with a zero timeout.
pub async fn poll_until<T, O, F, Fut>(
    options: &WaitOptions,
    mut probe: F,
) -> Result<T, WaitTimeout<O>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Probe<T, O>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let interval = options.poll_interval().max(Duration::from_millis(1));
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        let last = match probe().await {
            Probe::Ready(value) => return Ok(value),
            Probe::Pending(observed) => observed,
        };

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitTimeout {
                elapsed: now.duration_since(start),
                attempts,
                last: Some(last),
            });
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, 5_000);
            assert_eq!(opts.poll_interval_ms, 50);
        }

        #[test]
        fn test_from_timeouts() {
            let timeouts = Timeouts::default();
            assert_eq!(WaitOptions::action(&timeouts).timeout_ms, 5_000);
            assert_eq!(WaitOptions::navigation(&timeouts).timeout_ms, 10_000);
        }

        #[test]
        fn test_builders() {
            let opts = WaitOptions::new().with_timeout(250).with_poll_interval(10);
            assert_eq!(opts.timeout(), Duration::from_millis(250));
            assert_eq!(opts.poll_interval(), Duration::from_millis(10));
        }
    }

    mod poll_until_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_ready_on_first_probe() {
            let result: Result<u32, WaitTimeout<()>> =
                poll_until(&WaitOptions::new(), || async { Probe::Ready(7) }).await;
            assert_eq!(result.unwrap(), 7);
        }

        #[tokio::test(start_paused = true)]
        async fn test_becomes_ready_after_polls() {
            let calls = AtomicU32::new(0);
            let result: Result<u32, WaitTimeout<String>> =
                poll_until(&WaitOptions::new().with_poll_interval(100), || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n >= 3 {
                            Probe::Ready(n)
                        } else {
                            Probe::Pending(format!("probe {n}"))
                        }
                    }
                })
                .await;
            assert_eq!(result.unwrap(), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_keeps_last_observation() {
            let calls = AtomicU32::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(300);
            let started = Instant::now();
            let result: Result<(), WaitTimeout<u32>> = poll_until(&opts, || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Probe::Pending(n) }
            })
            .await;

            let timeout = result.unwrap_err();
            // 0, 300, 600, 900 and the final probe at the 1000ms deadline
            assert_eq!(timeout.attempts, 5);
            assert_eq!(timeout.last, Some(5));
            assert_eq!(started.elapsed(), Duration::from_millis(1_000));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_still_probes_once() {
            let calls = AtomicU32::new(0);
            let result: Result<(), WaitTimeout<&str>> =
                poll_until(&WaitOptions::new().with_timeout(0), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Probe::Pending("never") }
                })
                .await;
            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }
}
