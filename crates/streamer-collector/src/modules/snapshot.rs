//! 스냅샷 수집 모듈.
//!
//! 추적 심볼 전체에 대해 한 속성을 동시에 조회(fan-out)하고,
//! 모든 심볼의 조회가 끝날 때까지 기다린 뒤(fan-in) 심볼별 결과를 반환합니다.
//!
//! - 동시 요청 수는 `concurrency`로 제한됩니다.
//! - 심볼별 조회는 `RetryPolicy`에 따라 재시도되고, 실패는 `failures`에 기록됩니다.
//! - 스냅샷 전체에 `deadline`이 적용됩니다. 초과 시 부분 결과 없이 에러를 반환합니다.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use streamer_core::{fetch_span, Attribute, HighLow, Symbol};
use streamer_exchange::{retry_fetch, FetchError, MarketDataClient, RetryPolicy};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

use crate::config::FetchConfig;
use crate::{CollectorError, Result};

/// 한 속성에 대한 수집 결과.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub attribute: Attribute,
    /// fan-out 직전에 한 번 기록한 주기 시각
    pub timestamp: DateTime<Utc>,
    /// 조회에 성공한 심볼의 값
    pub values: BTreeMap<Symbol, T>,
    /// 조회에 실패한 심볼의 마지막 에러
    pub failures: BTreeMap<Symbol, FetchError>,
    /// fan-out 부터 fan-in 까지 소요 시간
    pub elapsed: Duration,
}

impl<T> Snapshot<T> {
    /// 모든 심볼이 성공했는지 확인.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// 결과가 기록된 심볼 수 (성공 + 실패).
    pub fn symbol_count(&self) -> usize {
        self.values.len() + self.failures.len()
    }
}

/// 스냅샷 수집기.
pub struct SnapshotFetcher {
    client: Arc<dyn MarketDataClient>,
    symbols: Vec<Symbol>,
    retry: RetryPolicy,
    concurrency: usize,
    deadline: Duration,
}

impl SnapshotFetcher {
    /// 새 수집기 생성.
    pub fn new(client: Arc<dyn MarketDataClient>, symbols: Vec<Symbol>, config: &FetchConfig) -> Self {
        Self {
            client,
            symbols,
            retry: config.retry.clone(),
            concurrency: config.concurrency.max(1),
            deadline: config.snapshot_deadline,
        }
    }

    /// 추적 심볼 목록.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// 전체 심볼의 현재가 수집.
    pub async fn fetch_prices(&self, cancel: &CancellationToken) -> Result<Snapshot<Decimal>> {
        self.fetch_with(Attribute::Price, cancel, |client, symbol| {
            client.fetch_price(symbol)
        })
        .await
    }

    /// 전체 심볼의 로고 URL 수집.
    pub async fn fetch_logos(&self, cancel: &CancellationToken) -> Result<Snapshot<String>> {
        self.fetch_with(Attribute::Logo, cancel, |client, symbol| {
            client.fetch_logo_url(symbol)
        })
        .await
    }

    /// 전체 심볼의 52주 고/저 수집.
    pub async fn fetch_high_lows(&self, cancel: &CancellationToken) -> Result<Snapshot<HighLow>> {
        self.fetch_with(Attribute::HighLow, cancel, |client, symbol| {
            client.fetch_high_low(symbol)
        })
        .await
    }

    async fn fetch_with<T, F>(
        &self,
        attribute: Attribute,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<Snapshot<T>>
    where
        T: Send,
        F: for<'a> Fn(&'a dyn MarketDataClient, &'a Symbol) -> BoxFuture<'a, std::result::Result<T, FetchError>>
            + Sync,
    {
        let timestamp = Utc::now();
        let started = Instant::now();
        let client = self.client.as_ref();
        let retry = &self.retry;
        let op = &op;

        debug!(
            %attribute,
            symbols = self.symbols.len(),
            concurrency = self.concurrency,
            "스냅샷 수집 시작"
        );

        let fan_out = stream::iter(self.symbols.iter().cloned())
            .map(|symbol: Symbol| {
                async move {
                    let result = {
                        let s = &symbol;
                        retry_fetch(retry, cancel, |_| op(client, s))
                            .instrument(fetch_span!("fetch", s, attribute))
                            .await
                    };
                    (symbol, result)
                }
                .boxed()
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>();

        let results = tokio::select! {
            _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
            results = tokio::time::timeout(self.deadline, fan_out) => {
                results.map_err(|_| CollectorError::SnapshotDeadline {
                    attribute,
                    deadline: self.deadline,
                })?
            }
        };

        if cancel.is_cancelled() {
            return Err(CollectorError::Cancelled);
        }

        let mut values = BTreeMap::new();
        let mut failures = BTreeMap::new();
        for (symbol, result) in results {
            match result {
                Ok(value) => {
                    values.insert(symbol, value);
                }
                Err(e) => {
                    warn!(
                        %symbol,
                        %attribute,
                        permanent = e.is_permanent(),
                        error = %e,
                        "심볼 조회 실패"
                    );
                    failures.insert(symbol, e);
                }
            }
        }

        Ok(Snapshot {
            attribute,
            timestamp,
            values,
            failures,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 심볼별 지연과 응답을 지정하는 테스트용 클라이언트.
    struct ScriptedClient {
        prices: HashMap<String, (Duration, Decimal)>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(prices: &[(&str, u64, Decimal)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(s, ms, p)| (s.to_string(), (Duration::from_millis(*ms), *p)))
                    .collect(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataClient for ScriptedClient {
        fn vendor(&self) -> &str {
            "scripted"
        }

        async fn fetch_price(&self, symbol: &Symbol) -> std::result::Result<Decimal, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let result = match self.prices.get(symbol.as_str()) {
                Some((delay, price)) => {
                    tokio::time::sleep(*delay).await;
                    Ok(*price)
                }
                None => Err(FetchError::UnknownSymbol(symbol.to_string())),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn fetch_high_low(&self, symbol: &Symbol) -> std::result::Result<HighLow, FetchError> {
            Err(FetchError::UnknownSymbol(symbol.to_string()))
        }

        async fn fetch_logo_url(&self, symbol: &Symbol) -> std::result::Result<String, FetchError> {
            Ok(format!("http://x/{}.png", symbol))
        }
    }

    fn symbols(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|s| Symbol::new(s).unwrap()).collect()
    }

    fn fetch_config(concurrency: usize, deadline: Duration) -> FetchConfig {
        FetchConfig {
            retry: RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(50)),
            concurrency,
            snapshot_deadline: deadline,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_staggered_completion_returns_full_snapshot() {
        let client = Arc::new(ScriptedClient::new(&[
            ("AAPL", 0, dec!(150.00)),
            ("NVDA", 50, dec!(450.00)),
        ]));
        let fetcher = SnapshotFetcher::new(
            client,
            symbols(&["AAPL", "NVDA"]),
            &fetch_config(8, Duration::from_secs(5)),
        );

        let snapshot = fetcher
            .fetch_prices(&CancellationToken::new())
            .await
            .unwrap();

        assert!(snapshot.is_complete());
        assert_eq!(snapshot.values.len(), 2);
        assert_eq!(snapshot.values[&Symbol::new("AAPL").unwrap()], dec!(150.00));
        assert_eq!(snapshot.values[&Symbol::new("NVDA").unwrap()], dec!(450.00));
        assert!(snapshot.elapsed >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let script: Vec<(&str, u64, Decimal)> =
            names.iter().map(|n| (*n, 100, dec!(1))).collect();
        let client = Arc::new(ScriptedClient::new(&script));

        let fetcher = SnapshotFetcher::new(
            client.clone(),
            symbols(&names),
            &fetch_config(3, Duration::from_secs(5)),
        );

        let snapshot = fetcher
            .fetch_prices(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(snapshot.values.len(), names.len());
        assert_eq!(client.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_reported_per_symbol() {
        let client = Arc::new(ScriptedClient::new(&[("GE", 0, dec!(12.5))]));
        let fetcher = SnapshotFetcher::new(
            client,
            symbols(&["GE", "ZZZZ"]),
            &fetch_config(4, Duration::from_secs(5)),
        );

        let snapshot = fetcher
            .fetch_prices(&CancellationToken::new())
            .await
            .unwrap();

        assert!(!snapshot.is_complete());
        assert_eq!(snapshot.symbol_count(), 2);
        assert_eq!(snapshot.values.len(), 1);
        assert!(matches!(
            snapshot.failures.get(&Symbol::new("ZZZZ").unwrap()),
            Some(FetchError::UnknownSymbol(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let client = Arc::new(ScriptedClient::new(&[
            ("GE", 0, dec!(1)),
            ("TSLA", 10_000, dec!(2)),
        ]));
        let fetcher = SnapshotFetcher::new(
            client,
            symbols(&["GE", "TSLA"]),
            &fetch_config(4, Duration::from_secs(1)),
        );

        let err = fetcher
            .fetch_prices(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CollectorError::SnapshotDeadline {
                attribute: Attribute::Price,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_in_flight_fetch() {
        let client = Arc::new(ScriptedClient::new(&[("GE", 60_000, dec!(1))]));
        let fetcher = SnapshotFetcher::new(
            client,
            symbols(&["GE"]),
            &fetch_config(4, Duration::from_secs(120)),
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let err = fetcher.fetch_prices(&cancel).await.unwrap_err();
        assert!(matches!(err, CollectorError::Cancelled));
    }

    #[tokio::test]
    async fn test_fetch_logos() {
        let client = Arc::new(ScriptedClient::new(&[]));
        let fetcher = SnapshotFetcher::new(
            client,
            symbols(&["GE", "AAPL"]),
            &fetch_config(2, Duration::from_secs(5)),
        );

        let snapshot = fetcher.fetch_logos(&CancellationToken::new()).await.unwrap();
        assert_eq!(
            snapshot.values.get(&Symbol::new("GE").unwrap()).map(String::as_str),
            Some("http://x/GE.png")
        );
        assert_eq!(snapshot.attribute, Attribute::Logo);
    }
}
