//! 다중 주기 스케줄러.
//!
//! 가격, 로고, 52주 고/저 세 루프가 각자의 주기로 독립 실행됩니다.
//! 루프 1회: 스냅샷 수집 → 저장 → 주기만큼 대기. 대기는 저장이 끝난 뒤 시작하므로
//! 같은 루프의 주기가 겹치지 않습니다.
//!
//! 각 루프는 별도 task 로 실행되어 서로의 실패에 영향을 받지 않습니다.
//! 저장소 재시도 소진은 해당 루프만 종료시킵니다.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use streamer_core::Attribute;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::persist::StorageManager;
use super::snapshot::{Snapshot, SnapshotFetcher};
use crate::config::CadenceConfig;
use crate::{CollectorError, CycleStats, LoopExit, LoopReport, Result};

/// 세 수집 루프를 관리하는 스케줄러.
#[derive(Clone)]
pub struct CadenceScheduler {
    fetcher: Arc<SnapshotFetcher>,
    storage: Arc<StorageManager>,
    cadence: CadenceConfig,
}

impl CadenceScheduler {
    /// 새 스케줄러 생성.
    pub fn new(
        fetcher: Arc<SnapshotFetcher>,
        storage: Arc<StorageManager>,
        cadence: CadenceConfig,
    ) -> Self {
        Self {
            fetcher,
            storage,
            cadence,
        }
    }

    /// 속성별 루프 주기.
    pub fn interval(&self, attribute: Attribute) -> Duration {
        match attribute {
            Attribute::Price => self.cadence.price_interval,
            Attribute::Logo => self.cadence.logo_interval,
            Attribute::HighLow => self.cadence.high_low_interval,
        }
    }

    /// 한 속성에 대해 수집 + 저장을 1회 수행합니다.
    pub async fn run_cycle(
        &self,
        attribute: Attribute,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome> {
        let started = Instant::now();

        let outcome = match attribute {
            Attribute::Price => {
                let snapshot = self.fetcher.fetch_prices(cancel).await?;
                let written = self.storage.persist_prices(&snapshot, cancel).await?;
                CycleOutcome::from_snapshot(&snapshot, written, |p| p.to_string())
            }
            Attribute::Logo => {
                let snapshot = self.fetcher.fetch_logos(cancel).await?;
                let written = self.storage.persist_logos(&snapshot, cancel).await?;
                CycleOutcome::from_snapshot(&snapshot, written, |url| url.clone())
            }
            Attribute::HighLow => {
                let snapshot = self.fetcher.fetch_high_lows(cancel).await?;
                let written = self.storage.persist_high_lows(&snapshot, cancel).await?;
                CycleOutcome::from_snapshot(&snapshot, written, |r| {
                    format!("high={} low={}", r.high, r.low)
                })
            }
        };

        Ok(outcome.with_elapsed(started.elapsed()))
    }

    /// 한 속성의 루프를 종료 신호 또는 복구 불가 에러까지 실행합니다.
    pub async fn run_loop(&self, attribute: Attribute, cancel: CancellationToken) -> LoopReport {
        let interval = self.interval(attribute);
        let mut report = LoopReport::new(attribute);

        info!(
            %attribute,
            interval_secs = interval.as_secs_f64(),
            symbols = self.fetcher.symbols().len(),
            "수집 루프 시작"
        );

        loop {
            match self.run_cycle(attribute, &cancel).await {
                Ok(outcome) => {
                    outcome.stats.log_summary();
                    report.record(&outcome.stats);
                }
                Err(CollectorError::Cancelled) => break,
                Err(e @ CollectorError::SnapshotDeadline { .. }) => {
                    report.missed_cycles += 1;
                    warn!(%attribute, error = %e, "스냅샷 마감 초과, 이번 주기 건너뜀");
                }
                Err(e) => {
                    error!(%attribute, error = %e, "복구 불가 에러, 루프 종료");
                    report.exit = LoopExit::Fatal(e.to_string());
                    break;
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        report.log_summary();
        report
    }

    /// 세 루프를 각각 별도 task 로 시작합니다.
    pub fn spawn(&self, cancel: &CancellationToken) -> Vec<(Attribute, JoinHandle<LoopReport>)> {
        Attribute::all()
            .into_iter()
            .map(|attribute| {
                let scheduler = self.clone();
                let token = cancel.child_token();
                let handle = tokio::spawn(async move { scheduler.run_loop(attribute, token).await });
                (attribute, handle)
            })
            .collect()
    }

    /// 세 루프를 시작하고 모두 끝날 때까지 기다립니다.
    ///
    /// 한 루프가 비정상 종료해도 나머지 루프는 계속 실행됩니다.
    pub async fn run(&self, cancel: &CancellationToken) -> Vec<LoopReport> {
        let handles = self.spawn(cancel);
        let mut reports = Vec::with_capacity(handles.len());

        for (attribute, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(%attribute, error = %e, "루프 task 비정상 종료");
                    let mut report = LoopReport::new(attribute);
                    report.exit = LoopExit::Fatal(format!("task failed: {}", e));
                    reports.push(report);
                }
            }
        }

        reports
    }
}

/// `run_cycle` 결과: 통계와 출력용 심볼별 값.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub stats: CycleStats,
    /// 스냅샷 주기 시각
    pub timestamp: DateTime<Utc>,
    /// (심볼, 표시 문자열) - 성공한 심볼만
    pub values: Vec<(String, String)>,
    /// (심볼, 에러 메시지) - 실패한 심볼만
    pub failures: Vec<(String, String)>,
}

impl CycleOutcome {
    fn from_snapshot<T>(snapshot: &Snapshot<T>, written: usize, display: impl Fn(&T) -> String) -> Self {
        let mut stats = CycleStats::new(snapshot.attribute);
        stats.total = snapshot.symbol_count();
        stats.success = snapshot.values.len();
        stats.failed = snapshot.failures.len();
        stats.written = written;
        stats.fetch_elapsed = snapshot.elapsed;

        Self {
            stats,
            timestamp: snapshot.timestamp,
            values: snapshot
                .values
                .iter()
                .map(|(symbol, value)| (symbol.to_string(), display(value)))
                .collect(),
            failures: snapshot
                .failures
                .iter()
                .map(|(symbol, e)| (symbol.to_string(), e.to_string()))
                .collect(),
        }
    }

    fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.stats.elapsed = elapsed;
        self
    }
}
