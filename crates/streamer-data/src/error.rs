//! 저장소 오류 타입.

use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 잘못된 데이터 (저장된 행을 도메인 타입으로 변환 실패)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 설정 오류 (테이블 이름 등)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 주입된 장애 (MemoryStore)
    #[error("Injected failure on {0}")]
    Injected(String),
}

impl DataError {
    /// 같은 쓰기를 다시 시도할 가치가 있는지 확인.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DataError::InvalidData(_) | DataError::ConfigError(_))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DataError::ConnectionError(err.to_string())
            }
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
