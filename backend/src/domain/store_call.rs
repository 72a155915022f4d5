//! Deadline for calls into backing stores.
//!
//! Store calls are the only suspension points in request handling. Each one
//! runs under a deadline so a stalled database surfaces as
//! `service_unavailable` instead of a hung request.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::domain::Error;

/// Default deadline applied to store calls.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call deadline for store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeout(Duration);

impl StoreTimeout {
    pub fn new(limit: Duration) -> Self {
        Self(limit)
    }

    pub fn limit(&self) -> Duration {
        self.0
    }

    /// Deadline in whole milliseconds, clamped to `u64::MAX`.
    pub fn limit_millis(&self) -> u64 {
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }

    /// Await `call`, mapping its error with `map_err`, or fail once the
    /// deadline passes.
    pub async fn run<T, E, F>(
        &self,
        operation: &'static str,
        call: F,
        map_err: impl FnOnce(E) -> Error,
    ) -> Result<T, Error>
    where
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.0, call).await {
            Ok(result) => result.map_err(map_err),
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.limit_millis(),
                    "store call timed out"
                );
                Err(Error::service_unavailable(format!(
                    "{operation} did not complete in time"
                )))
            }
        }
    }
}

impl Default for StoreTimeout {
    fn default() -> Self {
        Self(DEFAULT_STORE_TIMEOUT)
    }
}
