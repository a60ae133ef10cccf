//! Bounded retry with exponential backoff

use std::fmt::Display;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// How often an upload is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one (at least 1)
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

/// The last error of a retry loop that ran out of attempts
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Number of attempts made
    pub attempts: u32,
    /// Error returned by the final attempt
    pub last_error: E,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Run `op` until it succeeds or the attempts are used up
    ///
    /// `op` receives the 1-based attempt number. The calling thread sleeps
    /// between attempts; there is no sleep after the final failure.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, Exhausted<E>>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: err,
                    })
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, max_attempts, err, delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.backoff(80), Duration::from_secs(u64::from(u32::MAX)));
    }

    #[test]
    fn test_succeeds_after_failures() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let mut calls = 0;
        let result: Result<&str, Exhausted<String>> = policy.run(|attempt| {
            calls += 1;
            if attempt < 5 {
                Err(format!("transient failure {}", attempt))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_exhausts_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result: Result<(), Exhausted<String>> =
            policy.run(|attempt| Err(format!("failure {}", attempt)));
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last_error, "failure 3");
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        assert_eq!(policy.max_attempts, 1);
    }
}
