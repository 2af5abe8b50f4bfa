//! Caller-side retry for optimistic concurrency conflicts.
//!
//! The engine surfaces `EngineError::Conflict` instead of looping internally;
//! this wrapper is the one sanctioned place to retry, and it re-runs the
//! *whole* operation (reload, re-check, re-mutate), never just the write. All
//! other errors are terminal business outcomes and pass through untouched.

use std::time::Duration;

use tracing::debug;

use crate::engine::EngineError;

/// Bounded retry policy for conflicted operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(25),
        }
    }
}

/// Run `op` until it succeeds, fails with a non-conflict error, or the attempt
/// budget is exhausted (in which case the last conflict is returned).
pub fn with_retry<T>(
    policy: &RetryPolicy,
    mut op: impl FnMut() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    let attempts = policy.max_attempts.max(1);

    let mut last_conflict = None;
    for attempt in 1..=attempts {
        match op() {
            Err(EngineError::Conflict(msg)) => {
                debug!(attempt, attempts, "retrying after concurrency conflict");
                last_conflict = Some(EngineError::Conflict(msg));
                if attempt < attempts && !policy.backoff.is_zero() {
                    std::thread::sleep(policy.backoff);
                }
            }
            other => return other,
        }
    }

    // attempts >= 1, so a conflict was recorded on every iteration.
    Err(last_conflict.unwrap_or_else(|| EngineError::Conflict("retries exhausted".to_string())))
}
