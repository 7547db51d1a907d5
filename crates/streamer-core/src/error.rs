//! 핵심 도메인 에러 타입.

use thiserror::Error;

/// 도메인 값 검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// 빈 심볼
    #[error("Symbol must not be empty")]
    EmptySymbol,

    /// 허용 길이 초과 (stock_name varchar(6))
    #[error("Symbol too long ({len} > {max}): {symbol}")]
    SymbolTooLong {
        symbol: String,
        len: usize,
        max: usize,
    },

    /// 허용되지 않은 문자
    #[error("Invalid character {ch:?} in symbol: {symbol}")]
    InvalidSymbolChar { symbol: String, ch: char },

    /// 알 수 없는 수집 속성
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// 잘못된 52주 범위 (high < low)
    #[error("Invalid 52-week range for {symbol}: high {high} < low {low}")]
    InvalidRange {
        symbol: String,
        high: String,
        low: String,
    },
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CoreError>;
