//! Time limits and cancellation for outstanding operations.
//!
//! Every remote call and every decode goes through [`bounded`], so nothing
//! the studio awaits can hang forever.

use crate::error::{AppError, Result};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::warn;

/// Cloneable handle used to cancel an operation from elsewhere.
#[derive(Clone, Default, Debug)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default, Debug)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Runs `fut` until it finishes, `limit` elapses, or `cancel` fires.
pub async fn bounded<T, F>(
    operation: &'static str,
    limit: Duration,
    cancel: &CancelToken,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(AppError::Cancelled(operation));
    }

    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::Cancelled(operation)),
        outcome = tokio::time::timeout(limit, fut) => match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, limit_secs = limit.as_secs(), "operation timed out");
                Err(AppError::Timeout { operation, limit })
            }
        },
    }
}

/// Runs blocking work (decoding, rasterizing) off the async threads, bounded
/// like any other operation.
pub async fn bounded_blocking<T, F>(
    operation: &'static str,
    limit: Duration,
    cancel: &CancelToken,
    work: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    bounded(operation, limit, cancel, async move {
        match tokio::task::spawn_blocking(work).await {
            Ok(result) => result,
            Err(e) => Err(AppError::image(format!("{operation} worker failed: {e}"))),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_result() {
        let token = CancelToken::new();
        let value = bounded("add", Duration::from_secs(1), &token, async { Ok(2 + 2) })
            .await
            .unwrap();
        assert_eq!(value, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_operation_times_out() {
        let token = CancelToken::new();
        let result: Result<()> = bounded(
            "decode",
            Duration::from_secs(3),
            &token,
            std::future::pending(),
        )
        .await;
        assert!(matches!(
            result,
            Err(AppError::Timeout { operation: "decode", .. })
        ));
    }

    #[tokio::test]
    async fn cancel_wakes_pending_operation() {
        let token = CancelToken::new();
        let remote = token.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            remote.cancel();
        });
        let result: Result<()> = bounded(
            "refine",
            Duration::from_secs(60),
            &token,
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(AppError::Cancelled("refine"))));
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        let result = bounded("generate", Duration::from_secs(1), &token, async { Ok(1) }).await;
        assert!(matches!(result, Err(AppError::Cancelled("generate"))));
    }

    #[tokio::test]
    async fn blocking_work_returns_its_value() {
        let token = CancelToken::new();
        let n = bounded_blocking("sum", Duration::from_secs(5), &token, || Ok((1..=4).sum::<u32>()))
            .await
            .unwrap();
        assert_eq!(n, 10);
    }
}
