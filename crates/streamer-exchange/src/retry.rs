//! 제한 재시도 정책.
//!
//! 일시적 에러(`FetchError::is_retryable`)만 지수 백오프로 재시도하고,
//! 영구 에러는 즉시 반환합니다. 모든 대기 지점에서 취소 신호를 확인합니다.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::FetchError;

/// 재시도 정책.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함, 최소 1)
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 시간
    pub initial_backoff: Duration,
    /// 대기 시간 상한
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// 새 정책 생성.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// 재시도 없이 한 번만 시도하는 정책.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// `attempt`번째 시도 실패 후 대기 시간 (1부터 시작).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exp)
            .min(self.max_backoff)
    }
}

/// 정책에 따라 `op`를 재시도합니다.
///
/// `op`에는 1부터 시작하는 시도 번호가 전달됩니다.
/// 재시도 횟수를 소진하면 마지막 에러를 `FetchError::RetriesExhausted`로 감싸 반환합니다.
pub async fn retry_fetch<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = op(attempt) => result,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !err.is_retryable() {
            debug!(attempt, error = %err, "재시도 불가 에러");
            return Err(err);
        }

        if attempt >= max_attempts {
            return Err(FetchError::RetriesExhausted {
                attempts: attempt,
                source: Box::new(err),
            });
        }

        let mut delay = policy.backoff(attempt);
        if let Some(hint) = err.retry_delay_ms() {
            delay = delay.max(Duration::from_millis(hint));
        }

        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "조회 실패, 재시도 대기"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
