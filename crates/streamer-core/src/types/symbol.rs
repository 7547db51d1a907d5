//! 티커 심볼 정의.
//!
//! 저장소의 `stock_name varchar(6)` 컬럼에 그대로 기록되므로
//! 생성 시점에 길이와 문자 집합을 검증합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// 심볼 최대 길이.
pub const MAX_SYMBOL_LEN: usize = 6;

/// 추적 대상 티커 심볼 (예: "AAPL", "BRK.B").
///
/// 항상 대문자로 정규화되며 생성 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let ticker = raw.as_ref().trim().to_uppercase();

        if ticker.is_empty() {
            return Err(CoreError::EmptySymbol);
        }

        let len = ticker.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(CoreError::SymbolTooLong {
                symbol: ticker,
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(ch) = ticker
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
        {
            return Err(CoreError::InvalidSymbolChar { symbol: ticker, ch });
        }

        Ok(Self(ticker))
    }

    /// 쉼표로 구분된 목록을 파싱합니다 (중복 제거, 입력 순서 유지).
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        let mut symbols: Vec<Self> = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let symbol = Self::new(part)?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    /// 티커 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
