//! 저장소 인터페이스와 구현.
//!
//! # 쓰기 의미론
//!
//! - **가격** (`stock_prices`): 항상 새 행 추가. 기존 행은 수정/삭제하지 않음.
//! - **로고** (`stock_image_urls`), **52주 고/저** (`stock_highlow`):
//!   심볼당 현재 행 1개만 유지. 갱신은 원자적 교체.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use streamer_core::{HighLowRange, LogoReference, PriceObservation};

use crate::error::{DataError, Result};

/// 대상 테이블 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// 가격 관측치 (append-only)
    Prices,
    /// 로고 URL (참조 테이블)
    Logos,
    /// 52주 고가/저가 (참조 테이블)
    HighLows,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Prices => write!(f, "prices"),
            TableKind::Logos => write!(f, "logos"),
            TableKind::HighLows => write!(f, "high_lows"),
        }
    }
}

/// 테이블 이름 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub prices: String,
    pub logos: String,
    pub high_lows: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            prices: "stock_prices".to_string(),
            logos: "stock_image_urls".to_string(),
            high_lows: "stock_highlow".to_string(),
        }
    }
}

impl TableNames {
    /// 종류별 테이블 이름.
    pub fn get(&self, kind: TableKind) -> &str {
        match kind {
            TableKind::Prices => &self.prices,
            TableKind::Logos => &self.logos,
            TableKind::HighLows => &self.high_lows,
        }
    }

    /// SQL에 직접 삽입되므로 식별자 형식만 허용합니다 (`schema.table` 포함).
    pub fn validate(&self) -> Result<()> {
        for kind in [TableKind::Prices, TableKind::Logos, TableKind::HighLows] {
            let name = self.get(kind);
            if !is_sql_identifier(name) {
                return Err(DataError::ConfigError(format!(
                    "invalid table name for {}: {:?}",
                    kind, name
                )));
            }
        }
        Ok(())
    }
}

fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// 시세 저장소 trait.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// 저장소 이름 (로그용)
    fn name(&self) -> &str;

    /// 가격 관측치 1행 추가.
    async fn insert_observation(&self, observation: &PriceObservation) -> Result<()>;

    /// 심볼의 로고 행을 교체 (호출 후 해당 심볼 행은 정확히 1개).
    async fn replace_logo(&self, logo: &LogoReference) -> Result<()>;

    /// 심볼의 52주 고/저 행을 교체 (호출 후 해당 심볼 행은 정확히 1개).
    async fn replace_high_low(&self, range: &HighLowRange) -> Result<()>;

    /// `since` 이후 가격 관측치 (시간순).
    async fn recent_prices(&self, since: DateTime<Utc>) -> Result<Vec<PriceObservation>>;

    /// 현재 로고 전체.
    async fn logos(&self) -> Result<Vec<LogoReference>>;

    /// 현재 52주 고/저 전체.
    async fn high_lows(&self) -> Result<Vec<HighLowRange>>;

    /// 연결 상태 확인.
    async fn health_check(&self) -> Result<()>;

    /// 연결 정리.
    async fn close(&self);
}
