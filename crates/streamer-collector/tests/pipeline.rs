//! 수집 → 저장 파이프라인 통합 테스트
//!
//! 지연 시간을 지정한 가짜 시세 클라이언트와 메모리 저장소로
//! 스케줄러 전체 흐름을 검증합니다. tokio 가상 시간을 사용합니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use streamer_collector::config::{CadenceConfig, FetchConfig, StorageRetryConfig};
use streamer_collector::modules::{CadenceScheduler, SnapshotFetcher, StorageManager};
use streamer_collector::LoopExit;
use streamer_core::{Attribute, HighLow, Symbol};
use streamer_data::{MemoryStore, QuoteStore, TableKind};
use streamer_exchange::{FetchError, MarketDataClient, RetryPolicy};
use tokio_util::sync::CancellationToken;

/// 심볼별 응답 지연과 가격을 지정하는 테스트용 클라이언트
struct DelayedClient {
    quotes: HashMap<String, (Duration, Decimal)>,
}

impl DelayedClient {
    fn new(quotes: &[(&str, u64, Decimal)]) -> Self {
        Self {
            quotes: quotes
                .iter()
                .map(|(s, ms, p)| (s.to_string(), (Duration::from_millis(*ms), *p)))
                .collect(),
        }
    }

    async fn lookup(&self, symbol: &Symbol) -> Result<Decimal, FetchError> {
        match self.quotes.get(symbol.as_str()) {
            Some((delay, price)) => {
                tokio::time::sleep(*delay).await;
                Ok(*price)
            }
            None => Err(FetchError::UnknownSymbol(symbol.to_string())),
        }
    }
}

#[async_trait]
impl MarketDataClient for DelayedClient {
    fn vendor(&self) -> &str {
        "delayed"
    }

    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal, FetchError> {
        self.lookup(symbol).await
    }

    async fn fetch_high_low(&self, symbol: &Symbol) -> Result<HighLow, FetchError> {
        let price = self.lookup(symbol).await?;
        Ok(HighLow {
            high: price * dec!(1.2),
            low: price * dec!(0.8),
        })
    }

    async fn fetch_logo_url(&self, symbol: &Symbol) -> Result<String, FetchError> {
        self.lookup(symbol).await?;
        Ok(format!(
            "https://storage.googleapis.com/iex/api/logos/{}.png",
            symbol
        ))
    }
}

fn symbols(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|s| Symbol::new(s).unwrap()).collect()
}

fn sym(s: &str) -> Symbol {
    Symbol::new(s).unwrap()
}

struct Harness {
    store: Arc<MemoryStore>,
    scheduler: CadenceScheduler,
}

fn harness(
    client: DelayedClient,
    names: &[&str],
    cadence: CadenceConfig,
    deadline: Duration,
    storage: StorageRetryConfig,
) -> Harness {
    let store = Arc::new(MemoryStore::with_write_log());
    let fetch = FetchConfig {
        retry: RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(100)),
        concurrency: 4,
        snapshot_deadline: deadline,
    };
    let fetcher = Arc::new(SnapshotFetcher::new(
        Arc::new(client),
        symbols(names),
        &fetch,
    ));
    let manager = Arc::new(StorageManager::new(store.clone(), storage));

    Harness {
        store,
        scheduler: CadenceScheduler::new(fetcher, manager, cadence),
    }
}

fn aapl_nvda() -> DelayedClient {
    DelayedClient::new(&[("AAPL", 0, dec!(150.00)), ("NVDA", 50, dec!(450.00))])
}

fn cadence(price_secs: u64, reference_secs: u64) -> CadenceConfig {
    CadenceConfig {
        price_interval: Duration::from_secs(price_secs),
        logo_interval: Duration::from_secs(reference_secs),
        high_low_interval: Duration::from_secs(reference_secs),
    }
}

fn cancel_after(token: &CancellationToken, after: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        token.cancel();
    });
}

#[tokio::test(start_paused = true)]
async fn test_price_cycle_rows_share_timestamp() {
    let h = harness(
        aapl_nvda(),
        &["AAPL", "NVDA"],
        cadence(5, 3600),
        Duration::from_secs(5),
        StorageRetryConfig::default(),
    );

    let outcome = h
        .scheduler
        .run_cycle(Attribute::Price, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.success, 2);
    assert_eq!(outcome.stats.written, 2);

    let rows = h.store.prices();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.timestamp == outcome.timestamp));

    let aapl = rows.iter().find(|r| r.symbol == sym("AAPL")).unwrap();
    let nvda = rows.iter().find(|r| r.symbol == sym("NVDA")).unwrap();
    assert_eq!(aapl.price, dec!(150.00));
    assert_eq!(nvda.price, dec!(450.00));
}

#[tokio::test(start_paused = true)]
async fn test_prices_append_per_cycle() {
    let h = harness(
        aapl_nvda(),
        &["AAPL", "NVDA"],
        cadence(5, 3600),
        Duration::from_secs(5),
        StorageRetryConfig::default(),
    );
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        h.scheduler.run_cycle(Attribute::Price, &cancel).await.unwrap();
    }

    assert_eq!(h.store.price_count(&sym("AAPL")), 3);
    assert_eq!(h.store.price_count(&sym("NVDA")), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reference_replace_keeps_one_row_per_symbol() {
    let h = harness(
        aapl_nvda(),
        &["AAPL", "NVDA"],
        cadence(5, 3600),
        Duration::from_secs(5),
        StorageRetryConfig::default(),
    );
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        h.scheduler.run_cycle(Attribute::Logo, &cancel).await.unwrap();
        h.scheduler.run_cycle(Attribute::HighLow, &cancel).await.unwrap();
    }

    let logos = h.store.logos().await.unwrap();
    assert_eq!(logos.len(), 2);
    assert!(logos[0].url.ends_with("AAPL.png"));

    let ranges = h.store.high_lows().await.unwrap();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[1].symbol, sym("NVDA"));
    assert_eq!(ranges[1].high, dec!(540.0000));
    assert_eq!(ranges[1].low, dec!(360.0000));
}

#[tokio::test(start_paused = true)]
async fn test_failed_symbol_does_not_block_others() {
    let h = harness(
        aapl_nvda(),
        &["AAPL", "ZZZZ", "NVDA"],
        cadence(5, 3600),
        Duration::from_secs(5),
        StorageRetryConfig::default(),
    );

    let outcome = h
        .scheduler
        .run_cycle(Attribute::Price, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.stats.total, 3);
    assert_eq!(outcome.stats.failed, 1);
    assert_eq!(outcome.failures[0].0, "ZZZZ");
    assert_eq!(h.store.prices().len(), 2);
    assert_eq!(h.store.price_count(&sym("ZZZZ")), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_spacing_is_at_least_interval() {
    let h = harness(
        aapl_nvda(),
        &["AAPL", "NVDA"],
        cadence(10, 3600),
        Duration::from_secs(5),
        StorageRetryConfig::default(),
    );
    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_secs(35));

    let report = h.scheduler.run_loop(Attribute::Price, cancel).await;

    assert_eq!(report.exit, LoopExit::Cancelled);
    assert!(report.cycles >= 3, "cycles = {}", report.cycles);

    let aapl_writes: Vec<_> = h
        .store
        .writes()
        .into_iter()
        .filter(|w| w.table == TableKind::Prices && w.symbol == sym("AAPL"))
        .map(|w| w.at)
        .collect();

    assert_eq!(aapl_writes.len() as u64, report.cycles);
    for pair in aapl_writes.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(10));
    }
}

#[tokio::test(start_paused = true)]
async fn test_deadline_skips_cycle_without_writes() {
    let client = DelayedClient::new(&[("AAPL", 0, dec!(150.00)), ("NVDA", 5_000, dec!(450.00))]);
    let h = harness(
        client,
        &["AAPL", "NVDA"],
        cadence(2, 3600),
        Duration::from_secs(1),
        StorageRetryConfig::default(),
    );
    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_secs(7));

    let report = h.scheduler.run_loop(Attribute::Price, cancel).await;

    assert_eq!(report.exit, LoopExit::Cancelled);
    assert_eq!(report.cycles, 0);
    assert!(report.missed_cycles >= 2, "missed = {}", report.missed_cycles);
    assert!(h.store.prices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_storage_failure_only_stops_its_own_loop() {
    let h = harness(
        aapl_nvda(),
        &["AAPL", "NVDA"],
        cadence(1, 3600),
        Duration::from_secs(5),
        StorageRetryConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(100),
        },
    );
    h.store.fail_writes(TableKind::Logos, None);

    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_secs(10));

    let reports = h.scheduler.run(&cancel).await;
    assert_eq!(reports.len(), 3);

    let by_attr = |a: Attribute| reports.iter().find(|r| r.attribute == a).unwrap();

    let logo = by_attr(Attribute::Logo);
    assert!(logo.is_fatal());
    assert_eq!(logo.cycles, 0);

    let price = by_attr(Attribute::Price);
    assert_eq!(price.exit, LoopExit::Cancelled);
    assert!(price.cycles >= 5, "price cycles = {}", price.cycles);
    assert_eq!(h.store.price_count(&sym("AAPL")) as u64, price.cycles);

    let high_low = by_attr(Attribute::HighLow);
    assert_eq!(high_low.exit, LoopExit::Cancelled);
    assert_eq!(high_low.cycles, 1);

    assert!(h.store.logos().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_all_loops() {
    let h = harness(
        aapl_nvda(),
        &["AAPL", "NVDA"],
        cadence(5, 3600),
        Duration::from_secs(5),
        StorageRetryConfig::default(),
    );
    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_secs(12));

    let reports = h.scheduler.run(&cancel).await;

    assert!(reports.iter().all(|r| r.exit == LoopExit::Cancelled));
    let price = reports
        .iter()
        .find(|r| r.attribute == Attribute::Price)
        .unwrap();
    assert_eq!(price.cycles, 3);
}
