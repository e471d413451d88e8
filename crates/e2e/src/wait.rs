//! Bounded polling used by every element wait
//!
//! A wait is a predicate checked at a fixed interval against a monotonic
//! deadline. The check always runs at least once, and once more exactly at the
//! deadline, so a zero timeout still means "check now".

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Default timeout for element waits
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for waits that end in a click
pub const DEFAULT_CLICK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// State an XPath match is awaited to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// At least one element matches
    Present,
    /// No element matches
    Absent,
    /// A match is displayed, enabled and unobscured
    Clickable,
}

impl Condition {
    /// Verb phrase used in timeout messages
    pub fn describe(&self) -> &'static str {
        match self {
            Condition::Present => "appear",
            Condition::Absent => "disappear",
            Condition::Clickable => "become clickable",
        }
    }
}

/// Fixed-interval poller with a deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Poller {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Same interval, different deadline
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Run `check` until it yields `Some`, the deadline passes, or it fails.
    ///
    /// A stale-element error from the check counts as "not yet"; any other
    /// error ends the wait immediately.
    pub async fn until<T, F, Fut>(
        &self,
        locator: &str,
        condition: Condition,
        mut check: F,
    ) -> E2eResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = E2eResult<Option<T>>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let interval = self.interval.max(MIN_POLL_INTERVAL);
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            match check().await {
                Ok(Some(value)) => {
                    debug!(
                        "{} reached '{}' after {} poll(s) ({} ms)",
                        locator,
                        condition.describe(),
                        polls,
                        start.elapsed().as_millis()
                    );
                    return Ok(value);
                }
                Ok(None) => {}
                Err(e) if e.is_stale() => {
                    debug!("Stale element while polling {}; retrying", locator);
                }
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(E2eError::Timeout {
                    locator: locator.to_string(),
                    condition: condition.describe(),
                    elapsed: now - start,
                });
            }

            sleep_until((now + interval).min(deadline)).await;
        }
    }
}
