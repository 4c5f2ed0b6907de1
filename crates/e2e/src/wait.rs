//! Bounded waiting at suspension points

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::trace;

use crate::error::E2eResult;

/// Per-suspension-point timeout and poll cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            poll_interval_ms: 100,
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
            poll_interval_ms: poll_interval.as_millis() as u64,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Result of waiting for a condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    Satisfied(T),
    TimedOut {
        /// Last successfully read value, if any read succeeded
        last: Option<T>,
        /// Last read error, if the final attempt failed
        last_error: Option<String>,
    },
}

impl<T> WaitOutcome<T> {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, WaitOutcome::Satisfied(_))
    }
}

/// Read repeatedly until `accept` holds or the policy's timeout elapses.
///
/// Always reads at least once. Read errors are treated as "not yet" (a page
/// mid-navigation cannot be queried) and reported if the wait times out.
/// Each read is itself bounded by the time left, so a stalled read cannot
/// outlive the policy.
pub async fn wait_for<T, F, Fut, A>(policy: &WaitPolicy, mut read: F, accept: A) -> WaitOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<T>>,
    A: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut last = None;
    let mut last_error;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let remaining = policy
            .timeout()
            .saturating_sub(start.elapsed())
            .max(policy.poll_interval());
        match timeout(remaining, read()).await {
            Ok(Ok(value)) if accept(&value) => return WaitOutcome::Satisfied(value),
            Ok(Ok(value)) => {
                last = Some(value);
                last_error = None;
            }
            Ok(Err(e)) => last_error = Some(e.to_string()),
            Err(_) => {
                last_error = Some(format!("read timed out after {}ms", remaining.as_millis()))
            }
        }

        if start.elapsed() >= policy.timeout() {
            trace!(attempts, "Wait timed out");
            return WaitOutcome::TimedOut { last, last_error };
        }
        sleep(policy.poll_interval()).await;
    }
}
