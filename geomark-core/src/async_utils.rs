//! Async utilities
//!
//! The only await point in geomark is the one-shot location request, which
//! must never hang the shell.

use crate::error::{ErrorContext, GeomarkError, GeomarkResult};
use tokio::time::{timeout, Duration};
use tracing::warn;

/// Timeout wrapper for async operations
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> GeomarkResult<T>
where
    F: std::future::Future<Output = T>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => Ok(result),
        Err(_) => {
            warn!(
                operation = operation_name,
                timeout_ms = timeout_ms,
                "Operation timed out"
            );
            Err(GeomarkError::Timeout {
                operation: operation_name.to_string(),
                duration_ms: timeout_ms,
                context: ErrorContext::new("async_utils")
                    .with_operation("timeout")
                    .with_metadata("timeout_ms", &timeout_ms.to_string())
                    .with_suggestion("Increase location.timeout_ms"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_timeout() {
        let value = with_timeout(async { 42 }, 100, "answer").await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_times_out() {
        let result = with_timeout(tokio::time::sleep(Duration::from_millis(200)), 10, "slow").await;
        match result {
            Err(GeomarkError::Timeout {
                operation,
                duration_ms,
                ..
            }) => {
                assert_eq!(operation, "slow");
                assert_eq!(duration_ms, 10);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }
}
