//! 에러 타입 정의.

use std::time::Duration;

use streamer_core::{Attribute, CoreError};
use streamer_data::{DataError, TableKind};
use streamer_exchange::FetchError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 재시도 후에도 실패한 저장소 쓰기
    #[error("Storage write to {table} for {symbol} failed after {attempts} attempts: {source}")]
    Storage {
        table: TableKind,
        symbol: String,
        attempts: u32,
        #[source]
        source: DataError,
    },

    /// 저장소 에러 (쓰기 이외: 연결, 조회)
    #[error("Database error: {0}")]
    Database(#[from] DataError),

    /// 시세 공급자 에러 (클라이언트 생성 등)
    #[error("Data source error: {0}")]
    DataSource(#[from] FetchError),

    /// 스냅샷 마감 시간 초과
    #[error("{attribute} snapshot exceeded deadline of {deadline:?}")]
    SnapshotDeadline {
        attribute: Attribute,
        deadline: Duration,
    },

    /// 종료 신호로 취소됨
    #[error("Cancelled")]
    Cancelled,
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
