//! Request-level timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::error_handling::BridgeError;

/// Runs an engine future under the request ceiling.
///
/// `timeout` of `None` applies [`DEFAULT_REQUEST_TIMEOUT`]. Exceeding the
/// ceiling cancels the future (dropping readers and in-memory output) and
/// surfaces [`BridgeError::Cancelled`].
pub async fn with_request_timeout<T, F>(
    timeout: Option<Duration>,
    fut: F,
) -> Result<T, BridgeError>
where
    F: Future<Output = Result<T, BridgeError>>,
{
    match tokio::time::timeout(timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT), fut).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::Cancelled),
    }
}
