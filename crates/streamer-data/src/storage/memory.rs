//! 프로세스 내 저장소.
//!
//! `--dry-run` 실행과 테스트에서 PostgreSQL 대신 사용합니다.
//! 테이블별 장애 주입과 쓰기 시각 기록을 지원합니다.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use streamer_core::{HighLowRange, LogoReference, PriceObservation, Symbol};
use tokio::time::Instant;

use super::{QuoteStore, TableKind};
use crate::error::{DataError, Result};

/// 쓰기 기록 1건.
#[derive(Debug, Clone)]
pub struct WriteEvent {
    pub table: TableKind,
    pub symbol: Symbol,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Tables {
    prices: Vec<PriceObservation>,
    logos: Vec<LogoReference>,
    high_lows: Vec<HighLowRange>,
    writes: Vec<WriteEvent>,
}

/// 남은 주입 장애 횟수 (`None` = 무기한).
#[derive(Debug, Clone, Copy)]
struct Fault {
    remaining: Option<u32>,
}

/// 메모리 기반 시세 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    faults: Mutex<HashMap<TableKind, Fault>>,
    /// 쓰기 시각 기록 여부 (기본 꺼짐)
    write_log: bool,
}

impl MemoryStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공한 쓰기마다 `WriteEvent`를 남기는 저장소 생성.
    pub fn with_write_log() -> Self {
        Self {
            write_log: true,
            ..Self::default()
        }
    }

    /// `table` 쓰기를 다음 `count`회 실패시킵니다 (`None`이면 해제 전까지 계속).
    pub fn fail_writes(&self, table: TableKind, count: Option<u32>) {
        self.lock_faults().insert(table, Fault { remaining: count });
    }

    /// 주입된 장애 해제.
    pub fn clear_faults(&self) {
        self.lock_faults().clear();
    }

    /// 저장된 가격 전체 (삽입 순서).
    pub fn prices(&self) -> Vec<PriceObservation> {
        self.lock_tables().prices.clone()
    }

    /// 심볼별 가격 행 수.
    pub fn price_count(&self, symbol: &Symbol) -> usize {
        self.lock_tables()
            .prices
            .iter()
            .filter(|p| &p.symbol == symbol)
            .count()
    }

    /// 성공한 쓰기 기록 (`with_write_log`로 생성한 경우만).
    pub fn writes(&self) -> Vec<WriteEvent> {
        self.lock_tables().writes.clone()
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_faults(&self) -> std::sync::MutexGuard<'_, HashMap<TableKind, Fault>> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 주입된 장애가 있으면 1회 소비하고 에러 반환.
    fn check_fault(&self, table: TableKind) -> Result<()> {
        let mut faults = self.lock_faults();
        let Some(fault) = faults.get_mut(&table) else {
            return Ok(());
        };

        let remaining = fault.remaining;
        match remaining {
            None => Err(DataError::Injected(table.to_string())),
            Some(n) if n <= 1 => {
                faults.remove(&table);
                if n == 0 {
                    Ok(())
                } else {
                    Err(DataError::Injected(table.to_string()))
                }
            }
            Some(n) => {
                fault.remaining = Some(n - 1);
                Err(DataError::Injected(table.to_string()))
            }
        }
    }

    fn record(&self, tables: &mut Tables, table: TableKind, symbol: &Symbol) {
        if !self.write_log {
            return;
        }
        tables.writes.push(WriteEvent {
            table,
            symbol: symbol.clone(),
            at: Instant::now(),
        });
    }
}

#[async_trait]
impl QuoteStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert_observation(&self, observation: &PriceObservation) -> Result<()> {
        self.check_fault(TableKind::Prices)?;
        let mut tables = self.lock_tables();
        tables.prices.push(observation.clone());
        self.record(&mut tables, TableKind::Prices, &observation.symbol);
        Ok(())
    }

    async fn replace_logo(&self, logo: &LogoReference) -> Result<()> {
        self.check_fault(TableKind::Logos)?;
        let mut tables = self.lock_tables();
        tables.logos.retain(|l| l.symbol != logo.symbol);
        tables.logos.push(logo.clone());
        self.record(&mut tables, TableKind::Logos, &logo.symbol);
        Ok(())
    }

    async fn replace_high_low(&self, range: &HighLowRange) -> Result<()> {
        self.check_fault(TableKind::HighLows)?;
        let mut tables = self.lock_tables();
        tables.high_lows.retain(|r| r.symbol != range.symbol);
        tables.high_lows.push(range.clone());
        self.record(&mut tables, TableKind::HighLows, &range.symbol);
        Ok(())
    }

    async fn recent_prices(&self, since: DateTime<Utc>) -> Result<Vec<PriceObservation>> {
        let mut prices: Vec<PriceObservation> = self
            .lock_tables()
            .prices
            .iter()
            .filter(|p| p.timestamp >= since)
            .cloned()
            .collect();
        prices.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(prices)
    }

    async fn logos(&self) -> Result<Vec<LogoReference>> {
        let mut logos = self.lock_tables().logos.clone();
        logos.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(logos)
    }

    async fn high_lows(&self) -> Result<Vec<HighLowRange>> {
        let mut ranges = self.lock_tables().high_lows.clone();
        ranges.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(ranges)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}
