//! Bounded store calls.

use std::{future::Future, time::Duration};

use crate::{AppError, AppResult};

/// Run `fut`, failing with a database error if it does not finish within `limit`.
///
/// Dropping the future on timeout rolls back any transaction it held.
pub async fn with_deadline<T, F>(limit: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(AppError::Database(format!("{operation} timed out")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result = with_deadline(Duration::from_secs(1), "noop", async { Ok(7) }).await;
        assert_eq!(result.ok(), Some(7));
    }

    #[tokio::test]
    async fn test_times_out_as_database_error() {
        let result: AppResult<()> = with_deadline(Duration::from_millis(5), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Database(msg)) if msg.contains("slow")));
    }

    #[tokio::test]
    async fn test_passes_through_errors() {
        let result: AppResult<()> = with_deadline(Duration::from_secs(1), "op", async {
            Err(AppError::Conflict("dup".to_string()))
        })
        .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
