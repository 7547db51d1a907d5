//! 시세 공급자 인터페이스.

use async_trait::async_trait;
use rust_decimal::Decimal;
use streamer_core::{HighLow, Symbol};

use crate::FetchError;

/// 공급자 중립적 시세 조회 trait.
///
/// 각 메서드는 정확히 한 번의 외부 요청을 수행하며 재시도하지 않습니다.
/// 재시도는 호출자가 `retry_fetch`로 감싸서 적용합니다.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// 공급자 이름 (로그용)
    fn vendor(&self) -> &str;

    /// 현재가 조회.
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal, FetchError>;

    /// 52주 고가/저가 조회.
    async fn fetch_high_low(&self, symbol: &Symbol) -> Result<HighLow, FetchError>;

    /// 로고 이미지 URL 조회.
    async fn fetch_logo_url(&self, symbol: &Symbol) -> Result<String, FetchError>;
}
