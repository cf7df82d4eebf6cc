//! Optimistic retry for read-compute-commit operations.

use std::future::Future;
use std::time::Duration;

use crate::error::WorkflowError;

/// Run `op` until it succeeds, fails with anything other than
/// `WorkflowError::Concurrency`, or `attempts` runs out.
///
/// Each attempt must re-read what it depends on. An exhausted budget is
/// reported as `Conflict`.
pub async fn with_retry<T, F, Fut>(operation: &'static str, attempts: u32, mut op: F) -> Result<T, WorkflowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(WorkflowError::Concurrency(msg)) if attempt < attempts => {
                tracing::debug!(operation, attempt, reason = %msg, "version conflict, retrying");
                tokio::time::sleep(Duration::from_millis(5 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(WorkflowError::Concurrency(msg)) => {
                tracing::warn!(operation, attempts, reason = %msg, "giving up after repeated version conflicts");
                return Err(WorkflowError::Conflict(format!(
                    "{operation} kept colliding with concurrent updates: {msg}"
                )));
            }
            other => return other,
        }
    }
}
