//! Rerun policy for flaky scenarios
//!
//! A rerun starts the scenario again from scratch; nothing from the failed
//! attempt is reused. The policy is keyed by scenario name so it can be
//! tuned from config without touching the scenarios.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::E2eResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Reruns for scenarios without a built-in or configured count
    pub default_reruns: u32,

    /// Per-scenario rerun counts; these win over everything else
    pub overrides: BTreeMap<String, u32>,
}

/// Outcome of running something under a [`RetryPolicy`]
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: E2eResult<T>,
    pub attempts: u32,
}

impl RetryPolicy {
    /// Reruns allowed for `name`, given the scenario's own marking
    pub fn reruns_for(&self, name: &str, marked: Option<u32>) -> u32 {
        self.overrides
            .get(name)
            .copied()
            .or(marked)
            .unwrap_or(self.default_reruns)
    }

    /// Run `attempt` until it succeeds or `reruns` extra tries are used up
    pub async fn run<T, F, Fut>(&self, name: &str, reruns: u32, mut attempt: F) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = E2eResult<T>>,
    {
        let max_attempts = reruns + 1;
        let mut n = 1;

        loop {
            match attempt(n).await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: n,
                    }
                }
                Err(e) if n < max_attempts => {
                    warn!("{} failed on attempt {}/{}: {}; rerunning", name, n, max_attempts, e);
                    n += 1;
                }
                Err(e) => {
                    return Attempted {
                        result: Err(e),
                        attempts: n,
                    }
                }
            }
        }
    }
}
