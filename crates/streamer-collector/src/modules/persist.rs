//! 스냅샷 저장 모듈.
//!
//! - 가격: 심볼마다 새 행 추가 (주기 시각 공유)
//! - 로고, 52주 고/저: 심볼마다 현재 행 교체
//!
//! 쓰기 1건마다 제한 재시도를 적용하고, 소진 시 `CollectorError::Storage`를 반환합니다.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use streamer_core::{HighLow, HighLowRange, LogoReference, PriceObservation, Symbol};
use streamer_data::{DataError, QuoteStore, TableKind};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::snapshot::Snapshot;
use crate::config::StorageRetryConfig;
use crate::{CollectorError, Result};

/// 참조 테이블 교체 대상.
#[derive(Debug, Clone)]
pub enum Reference {
    Logo(LogoReference),
    HighLow(HighLowRange),
}

impl Reference {
    fn table(&self) -> TableKind {
        match self {
            Reference::Logo(_) => TableKind::Logos,
            Reference::HighLow(_) => TableKind::HighLows,
        }
    }

    fn symbol(&self) -> &Symbol {
        match self {
            Reference::Logo(logo) => &logo.symbol,
            Reference::HighLow(range) => &range.symbol,
        }
    }
}

/// 스냅샷을 저장소에 반영하는 관리자.
pub struct StorageManager {
    store: Arc<dyn QuoteStore>,
    retry: StorageRetryConfig,
}

impl StorageManager {
    /// 새 관리자 생성.
    pub fn new(store: Arc<dyn QuoteStore>, retry: StorageRetryConfig) -> Self {
        Self { store, retry }
    }

    /// 가격 관측치 1행 추가.
    pub async fn insert_observation(
        &self,
        observation: &PriceObservation,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.write_with_retry(TableKind::Prices, &observation.symbol, cancel, move || {
            self.store.insert_observation(observation)
        })
        .await
    }

    /// 참조 테이블의 심볼 행 교체.
    pub async fn replace_reference(
        &self,
        reference: &Reference,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.write_with_retry(reference.table(), reference.symbol(), cancel, move || async move {
            match reference {
                Reference::Logo(logo) => self.store.replace_logo(logo).await,
                Reference::HighLow(range) => self.store.replace_high_low(range).await,
            }
        })
        .await
    }

    /// 가격 스냅샷 저장. 저장된 행 수 반환.
    pub async fn persist_prices(
        &self,
        snapshot: &Snapshot<Decimal>,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let mut written = 0;
        for (symbol, price) in &snapshot.values {
            let observation = PriceObservation {
                symbol: symbol.clone(),
                price: *price,
                timestamp: snapshot.timestamp,
            };
            self.insert_observation(&observation, cancel).await?;
            written += 1;
        }
        Ok(written)
    }

    /// 로고 스냅샷 저장. 저장된 행 수 반환.
    pub async fn persist_logos(
        &self,
        snapshot: &Snapshot<String>,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let mut written = 0;
        for (symbol, url) in &snapshot.values {
            let reference = Reference::Logo(LogoReference {
                symbol: symbol.clone(),
                url: url.clone(),
            });
            self.replace_reference(&reference, cancel).await?;
            written += 1;
        }
        Ok(written)
    }

    /// 52주 고/저 스냅샷 저장. 저장된 행 수 반환.
    pub async fn persist_high_lows(
        &self,
        snapshot: &Snapshot<HighLow>,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let mut written = 0;
        for (symbol, range) in &snapshot.values {
            let reference = Reference::HighLow(HighLowRange::new(symbol.clone(), *range));
            self.replace_reference(&reference, cancel).await?;
            written += 1;
        }
        Ok(written)
    }

    async fn write_with_retry<F, Fut>(
        &self,
        table: TableKind,
        symbol: &Symbol,
        cancel: &CancellationToken,
        mut write: F,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = streamer_data::Result<()>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut delay = self.retry.retry_delay;
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
                result = write() => result,
            };

            let err: DataError = match result {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= max_attempts {
                return Err(CollectorError::Storage {
                    table,
                    symbol: symbol.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }

            warn!(
                %table,
                %symbol,
                attempt,
                max_attempts,
                error = %err,
                "저장 실패, 재시도 대기"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }
}
