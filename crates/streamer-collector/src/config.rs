//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use streamer_core::Symbol;
use streamer_data::{DatabaseConfig, TableNames};
use streamer_exchange::{ClientSettings, MarketDataVendor, RetryPolicy};

use crate::{CollectorError, Result};

/// 기본 추적 심볼
pub const DEFAULT_SYMBOLS: &str = "GE,AMZN,GOOG,TSLA,AAPL,NFLX";

/// 기본 시세 API 주소
pub const DEFAULT_BASE_URL: &str = "https://api.iextrading.com/1.0/stock";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL (dry-run 시 불필요)
    pub database_url: Option<String>,
    /// 연결 풀 설정
    pub pool: PoolConfig,
    /// 대상 테이블
    pub tables: TableNames,
    /// 추적 심볼 (중복 없음, 입력 순서 유지)
    pub symbols: Vec<Symbol>,
    /// 시세 공급자 설정
    pub market_data: ClientSettings,
    /// 스냅샷 수집 설정
    pub fetch: FetchConfig,
    /// 루프 주기 설정
    pub cadence: CadenceConfig,
    /// 저장소 쓰기 재시도 설정
    pub storage: StorageRetryConfig,
}

/// 연결 풀 설정
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// 스냅샷 수집 설정
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 심볼별 재시도 정책
    pub retry: RetryPolicy,
    /// 동시 요청 수 상한
    pub concurrency: usize,
    /// 스냅샷 1회 마감 시간 (재시도 포함)
    pub snapshot_deadline: Duration,
}

/// 루프 주기 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceConfig {
    pub price_interval: Duration,
    pub logo_interval: Duration,
    pub high_low_interval: Duration,
}

/// 저장소 쓰기 재시도 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRetryConfig {
    /// 쓰기 1건당 최대 시도 횟수
    pub max_attempts: u32,
    /// 첫 재시도 전 대기 (이후 2배씩 증가)
    pub retry_delay: Duration,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            price_interval: Duration::from_secs(5),
            logo_interval: Duration::from_secs(6 * 3600),
            high_low_interval: Duration::from_secs(6 * 3600),
        }
    }
}

impl Default for StorageRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(get);

        let symbols = Symbol::parse_list(
            &vars.string("STOCK_SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()),
        )?;
        if symbols.is_empty() {
            return Err(CollectorError::Config(
                "STOCK_SYMBOLS 에 추적할 심볼이 없습니다".to_string(),
            ));
        }

        let vendor = match vars.string("MARKET_DATA_VENDOR") {
            Some(v) => v.parse::<MarketDataVendor>().map_err(CollectorError::Config)?,
            None => MarketDataVendor::default(),
        };

        let tables = TableNames {
            prices: vars
                .string("PRICE_TABLE")
                .unwrap_or_else(|| TableNames::default().prices),
            logos: vars
                .string("LOGO_TABLE")
                .unwrap_or_else(|| TableNames::default().logos),
            high_lows: vars
                .string("HIGHLOW_TABLE")
                .unwrap_or_else(|| TableNames::default().high_lows),
        };
        tables
            .validate()
            .map_err(|e| CollectorError::Config(e.to_string()))?;

        // RetryPolicy 는 0을 1로 올리므로 생성 전에 검사
        let fetch_max_attempts: u32 = vars.parse("FETCH_MAX_ATTEMPTS", 5);
        if fetch_max_attempts == 0 {
            return Err(CollectorError::Config(
                "FETCH_MAX_ATTEMPTS 은(는) 0보다 커야 합니다".to_string(),
            ));
        }

        let config = Self {
            database_url: vars.string("DATABASE_URL"),
            pool: PoolConfig {
                max_connections: vars.parse("DB_MAX_CONNECTIONS", 5),
                acquire_timeout_secs: vars.parse("DB_ACQUIRE_TIMEOUT_SECS", 30),
            },
            tables,
            symbols,
            market_data: ClientSettings {
                vendor,
                base_url: vars
                    .string("MARKET_DATA_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                token: vars.string("MARKET_DATA_TOKEN"),
                request_timeout: Duration::from_millis(vars.parse("FETCH_TIMEOUT_MS", 5000)),
            },
            fetch: FetchConfig {
                retry: RetryPolicy::new(
                    fetch_max_attempts,
                    Duration::from_millis(vars.parse("FETCH_INITIAL_BACKOFF_MS", 200)),
                    Duration::from_millis(vars.parse("FETCH_MAX_BACKOFF_MS", 5000)),
                ),
                concurrency: vars.parse("FETCH_CONCURRENCY", 8),
                snapshot_deadline: Duration::from_secs(vars.parse("SNAPSHOT_DEADLINE_SECS", 60)),
            },
            cadence: CadenceConfig {
                price_interval: Duration::from_secs(vars.parse("PRICE_INTERVAL_SECS", 5)),
                logo_interval: Duration::from_secs(vars.parse("LOGO_INTERVAL_SECS", 6 * 3600)),
                high_low_interval: Duration::from_secs(
                    vars.parse("HIGHLOW_INTERVAL_SECS", 6 * 3600),
                ),
            },
            storage: StorageRetryConfig {
                max_attempts: vars.parse("STORAGE_MAX_ATTEMPTS", 3),
                retry_delay: Duration::from_millis(vars.parse("STORAGE_RETRY_DELAY_MS", 500)),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// 0 이 허용되지 않는 값 검증.
    fn validate(&self) -> Result<()> {
        let zero_checks = [
            ("PRICE_INTERVAL_SECS", self.cadence.price_interval.is_zero()),
            ("LOGO_INTERVAL_SECS", self.cadence.logo_interval.is_zero()),
            ("HIGHLOW_INTERVAL_SECS", self.cadence.high_low_interval.is_zero()),
            ("SNAPSHOT_DEADLINE_SECS", self.fetch.snapshot_deadline.is_zero()),
            ("FETCH_TIMEOUT_MS", self.market_data.request_timeout.is_zero()),
            ("FETCH_CONCURRENCY", self.fetch.concurrency == 0),
            ("STORAGE_MAX_ATTEMPTS", self.storage.max_attempts == 0),
            ("DB_MAX_CONNECTIONS", self.pool.max_connections == 0),
        ];

        for (key, is_zero) in zero_checks {
            if is_zero {
                return Err(CollectorError::Config(format!(
                    "{} 은(는) 0보다 커야 합니다",
                    key
                )));
            }
        }
        Ok(())
    }

    /// 데이터베이스 연결 설정 (DATABASE_URL 필수).
    pub fn database(&self) -> Result<DatabaseConfig> {
        let url = self.database_url.clone().ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        Ok(DatabaseConfig {
            url,
            max_connections: self.pool.max_connections,
            acquire_timeout: Duration::from_secs(self.pool.acquire_timeout_secs),
        })
    }
}

/// 환경변수 조회 헬퍼.
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 공백 제거 후 비어 있지 않은 값
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// 값을 파싱 (실패 시 기본값 사용)
    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        match self.string(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = %raw, "잘못된 설정값, 기본값 사용");
                default
            }),
            None => default,
        }
    }
}
