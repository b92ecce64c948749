//! Cancellation and deadline guards for outbound calls.
//!
//! Both guards work for any error type a [`DriveError`] converts into, so
//! the API layer can bound a whole request with them.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::traits::DriveError;

/// Run `fut` unless `cancel` fires first. A cancelled call is dropped mid-flight.
pub async fn guard<F, T, E>(cancel: &CancellationToken, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DriveError>,
{
    if cancel.is_cancelled() {
        return Err(DriveError::Cancelled.into());
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DriveError::Cancelled.into()),
        result = fut => result,
    }
}

/// [`guard`] bounded by `deadline`.
pub async fn with_deadline<F, T, E>(
    deadline: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DriveError>,
{
    match tokio::time::timeout(deadline, guard(cancel, fut)).await {
        Ok(result) => result,
        Err(_) => Err(DriveError::TimedOut(deadline).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivedrop_core::AppError;

    #[tokio::test]
    async fn test_guard_passes_result_through() {
        let cancel = CancellationToken::new();
        let value = guard(&cancel, async { Ok::<_, DriveError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_guard_short_circuits_when_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = guard(&cancel, async { Ok::<_, DriveError>(()) }).await;
        assert!(matches!(result, Err(DriveError::Cancelled)));
    }

    #[tokio::test]
    async fn test_guard_interrupts_pending_call() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let result = guard(&cancel, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, DriveError>(())
        })
        .await;
        assert!(matches!(result, Err(DriveError::Cancelled)));
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let cancel = CancellationToken::new();
        let result = with_deadline(Duration::from_millis(10), &cancel, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, DriveError>(())
        })
        .await;
        assert!(matches!(result, Err(DriveError::TimedOut(_))));
    }

    #[tokio::test]
    async fn test_deadline_converts_into_app_error() {
        let cancel = CancellationToken::new();
        let result = with_deadline(Duration::from_millis(10), &cancel, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, AppError>(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout(_))));

        cancel.cancel();
        let result = with_deadline(Duration::from_secs(30), &cancel, async {
            Ok::<_, AppError>(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Cancelled(_))));
    }
}
