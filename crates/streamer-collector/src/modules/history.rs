//! 저장된 시세 요약.
//!
//! 최근 가격 이력과 참조 테이블(로고, 52주 고/저)을 심볼별로 묶어 보여줍니다.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use streamer_core::{HighLow, Symbol};
use streamer_data::QuoteStore;
use tracing::debug;

use crate::Result;

/// 기간 내 가격 통계.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub samples: usize,
    pub first_price: Decimal,
    pub latest_price: Decimal,
    pub latest_at: DateTime<Utc>,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl PriceSummary {
    /// 첫 가격 대비 변동률 (%). 첫 가격이 0이면 `None`.
    pub fn change_pct(&self) -> Option<Decimal> {
        if self.first_price.is_zero() {
            return None;
        }
        Some((self.latest_price - self.first_price) / self.first_price * Decimal::ONE_HUNDRED)
    }
}

/// 심볼 1개의 요약.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolHistory {
    pub symbol: Symbol,
    pub prices: Option<PriceSummary>,
    pub high_low: Option<HighLow>,
    pub logo_url: Option<String>,
}

impl SymbolHistory {
    fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            prices: None,
            high_low: None,
            logo_url: None,
        }
    }

    /// 최신 가격이 52주 범위 안에서 차지하는 위치 (0 = 저가, 100 = 고가).
    pub fn band_position(&self) -> Option<Decimal> {
        let prices = self.prices.as_ref()?;
        let range = self.high_low.as_ref()?;
        let width = range.width();
        if width.is_zero() {
            return None;
        }
        Some((prices.latest_price - range.low) / width * Decimal::ONE_HUNDRED)
    }
}

/// `since` 이후의 가격과 현재 참조 데이터를 심볼 순으로 요약합니다.
pub async fn summarize_history(
    store: &dyn QuoteStore,
    since: DateTime<Utc>,
) -> Result<Vec<SymbolHistory>> {
    let prices = store.recent_prices(since).await?;
    let logos = store.logos().await?;
    let ranges = store.high_lows().await?;

    debug!(
        prices = prices.len(),
        logos = logos.len(),
        high_lows = ranges.len(),
        "저장소 조회 완료"
    );

    let mut by_symbol: BTreeMap<Symbol, SymbolHistory> = BTreeMap::new();

    for observation in prices {
        let entry = by_symbol
            .entry(observation.symbol.clone())
            .or_insert_with(|| SymbolHistory::empty(observation.symbol.clone()));

        match entry.prices.as_mut() {
            None => {
                entry.prices = Some(PriceSummary {
                    samples: 1,
                    first_price: observation.price,
                    latest_price: observation.price,
                    latest_at: observation.timestamp,
                    min_price: observation.price,
                    max_price: observation.price,
                });
            }
            Some(summary) => {
                summary.samples += 1;
                summary.min_price = summary.min_price.min(observation.price);
                summary.max_price = summary.max_price.max(observation.price);
                if observation.timestamp >= summary.latest_at {
                    summary.latest_at = observation.timestamp;
                    summary.latest_price = observation.price;
                }
            }
        }
    }

    for logo in logos {
        by_symbol
            .entry(logo.symbol.clone())
            .or_insert_with(|| SymbolHistory::empty(logo.symbol.clone()))
            .logo_url = Some(logo.url);
    }

    for range in ranges {
        by_symbol
            .entry(range.symbol.clone())
            .or_insert_with(|| SymbolHistory::empty(range.symbol.clone()))
            .high_low = Some(range.range());
    }

    Ok(by_symbol.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use streamer_core::{HighLowRange, LogoReference, PriceObservation};
    use streamer_data::MemoryStore;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 14, minute, 0).unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (minute, price) in [(0, dec!(100)), (5, dec!(95)), (10, dec!(110))] {
            store
                .insert_observation(&PriceObservation {
                    symbol: sym("AAPL"),
                    price,
                    timestamp: at(minute),
                })
                .await
                .unwrap();
        }
        store
            .replace_high_low(&HighLowRange {
                symbol: sym("AAPL"),
                high: dec!(120),
                low: dec!(80),
            })
            .await
            .unwrap();
        store
            .replace_logo(&LogoReference {
                symbol: sym("GE"),
                url: "https://storage.googleapis.com/iex/api/logos/GE.png".to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_summarize_groups_by_symbol() {
        let store = seeded().await;

        let history = summarize_history(&store, at(0) - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].symbol, sym("AAPL"));
        assert_eq!(history[1].symbol, sym("GE"));

        let prices = history[0].prices.as_ref().unwrap();
        assert_eq!(prices.samples, 3);
        assert_eq!(prices.min_price, dec!(95));
        assert_eq!(prices.max_price, dec!(110));
        assert_eq!(prices.latest_price, dec!(110));
        assert_eq!(prices.latest_at, at(10));
        assert_eq!(prices.change_pct(), Some(dec!(10)));

        assert_eq!(history[0].band_position(), Some(dec!(75)));
        assert!(history[0].logo_url.is_none());

        assert!(history[1].prices.is_none());
        assert!(history[1].logo_url.as_deref().unwrap().ends_with("GE.png"));
        assert_eq!(history[1].band_position(), None);
    }

    #[tokio::test]
    async fn test_summarize_respects_since() {
        let store = seeded().await;

        let history = summarize_history(&store, at(5)).await.unwrap();
        let prices = history[0].prices.as_ref().unwrap();

        assert_eq!(prices.samples, 2);
        assert_eq!(prices.first_price, dec!(95));
    }

    #[tokio::test]
    async fn test_summarize_empty_store() {
        let store = MemoryStore::new();
        let history = summarize_history(&store, at(0)).await.unwrap();
        assert!(history.is_empty());
    }
}
