//! Deadline enforcement for store calls.

use std::future::Future;
use std::time::Duration;

use parkhub_core::error::AppError;
use parkhub_core::result::AppResult;

/// Run a store call, failing with a timeout error if it does not finish
/// within `limit`.
pub async fn within<T, F>(limit: Duration, operation: &'static str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(format!(
            "{operation} did not complete within {}ms",
            limit.as_millis()
        ))),
    }
}
