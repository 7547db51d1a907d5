//! 시세 레코드 타입.
//!
//! - `PriceObservation` - 가격 관측치 (append-only 시계열)
//! - `LogoReference` - 로고 URL (심볼당 현재값 1행)
//! - `HighLowRange` - 52주 고가/저가 (심볼당 현재값 1행)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::symbol::Symbol;
use crate::error::{CoreError, Result};

/// 수집 속성.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// 현재가
    Price,
    /// 로고 이미지 URL
    Logo,
    /// 52주 고가/저가
    HighLow,
}

impl Attribute {
    /// 모든 속성 반환.
    pub fn all() -> [Attribute; 3] {
        [Attribute::Price, Attribute::Logo, Attribute::HighLow]
    }

    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Price => "price",
            Attribute::Logo => "logo",
            Attribute::HighLow => "high_low",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "price" => Ok(Attribute::Price),
            "logo" | "image" => Ok(Attribute::Logo),
            "high_low" | "high-low" | "highlow" => Ok(Attribute::HighLow),
            _ => Err(CoreError::UnknownAttribute(s.to_string())),
        }
    }
}

/// 가격 관측치.
///
/// 한 수집 주기의 모든 심볼은 같은 `timestamp`를 공유합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub symbol: Symbol,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// 로고 참조.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoReference {
    pub symbol: Symbol,
    pub url: String,
}

/// 52주 고가/저가 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighLow {
    pub high: Decimal,
    pub low: Decimal,
}

impl HighLow {
    /// 고가 >= 저가 조건을 검증하여 생성합니다.
    pub fn new(symbol: &Symbol, high: Decimal, low: Decimal) -> Result<Self> {
        if high < low {
            return Err(CoreError::InvalidRange {
                symbol: symbol.to_string(),
                high: high.to_string(),
                low: low.to_string(),
            });
        }
        Ok(Self { high, low })
    }

    /// 범위 중간값
    pub fn midpoint(&self) -> Decimal {
        (self.high + self.low) / Decimal::TWO
    }

    /// 범위 폭
    pub fn width(&self) -> Decimal {
        self.high - self.low
    }
}

/// 52주 고가/저가 참조.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighLowRange {
    pub symbol: Symbol,
    pub high: Decimal,
    pub low: Decimal,
}

impl HighLowRange {
    /// 심볼과 값으로 생성
    pub fn new(symbol: Symbol, range: HighLow) -> Self {
        Self {
            symbol,
            high: range.high,
            low: range.low,
        }
    }

    /// 값 부분만 반환
    pub fn range(&self) -> HighLow {
        HighLow {
            high: self.high,
            low: self.low,
        }
    }
}
