//! Per-call time budget for external collaborators.

use casefile_core::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Run `future`, turning an elapsed budget into `AppError::Timeout`.
pub async fn with_timeout<T, F>(operation: &str, limit: Duration, future: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, secs = limit.as_secs(), "External call timed out");
            Err(AppError::Timeout {
                operation: operation.to_string(),
                secs: limit.as_secs(),
            })
        }
    }
}
