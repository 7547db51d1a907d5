//! StockStreamer 수집기 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 세 수집 루프 실행 (Ctrl+C 로 종료)
//! stock-streamer run
//!
//! # 로고 URL 1회 수집 후 출력
//! stock-streamer once logo
//!
//! # DB 없이 가격 1회 수집
//! stock-streamer --dry-run once price
//!
//! # 최근 7일 저장 데이터 요약
//! stock-streamer report --days 7
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use streamer_collector::modules::{
    summarize_history, CadenceScheduler, SnapshotFetcher, StorageManager,
};
use streamer_collector::{CollectorConfig, LoopExit};
use streamer_core::logging::{init_logging, LogConfig, LogFormat};
use streamer_core::Attribute;
use streamer_data::{MemoryStore, PostgresStore, QuoteStore};
use streamer_exchange::create_client;
use tokio_util::sync::CancellationToken;

/// `report --days` 상한
const MAX_REPORT_DAYS: i64 = 3650;

#[derive(Parser)]
#[command(name = "stock-streamer")]
#[command(about = "Stock quote streamer - 가격/로고/52주 고저 수집기", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// PostgreSQL 대신 메모리 저장소 사용
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 가격, 로고, 52주 고/저 루프를 종료 신호까지 실행
    Run,

    /// 한 속성을 1회 수집하여 저장하고 결과 출력
    Once {
        /// 수집 속성 (price, logo, high-low)
        attribute: Attribute,
    },

    /// 저장된 데이터 요약 출력
    Report {
        /// 조회 기간 (일, 1-3650)
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=MAX_REPORT_DAYS))]
        days: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(&LogConfig::new(&cli.log_level, cli.log_format))?;

    tracing::info!("StockStreamer 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        symbols = config.symbols.len(),
        vendor = %config.market_data.vendor,
        dry_run = cli.dry_run,
        "설정 로드 완료"
    );

    // 저장소 연결
    let store: Arc<dyn QuoteStore> = if cli.dry_run {
        tracing::warn!("dry-run 모드: 메모리 저장소 사용, 종료 시 데이터가 사라집니다");
        Arc::new(MemoryStore::new())
    } else {
        let store = PostgresStore::connect(&config.database()?, config.tables.clone()).await?;
        store.health_check().await?;
        tracing::info!("데이터베이스 연결 성공");
        Arc::new(store)
    };

    let result = execute(cli.command, &config, store.clone()).await;

    store.close().await;
    tracing::info!("StockStreamer 종료");

    result
}

async fn execute(
    command: Commands,
    config: &CollectorConfig,
    store: Arc<dyn QuoteStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Report { days } = command {
        print_report(store.as_ref(), report_since(Utc::now(), days)).await?;
        return Ok(());
    }

    let client = create_client(&config.market_data)?;
    tracing::info!(vendor = client.vendor(), "시세 클라이언트 생성");

    let fetcher = Arc::new(SnapshotFetcher::new(
        client,
        config.symbols.clone(),
        &config.fetch,
    ));
    let storage = Arc::new(StorageManager::new(store, config.storage.clone()));
    let scheduler = CadenceScheduler::new(fetcher, storage, config.cadence.clone());

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    match command {
        Commands::Run => {
            tracing::info!("=== 수집 루프 시작 ===");
            let reports = scheduler.run(&shutdown).await;

            let fatal: Vec<_> = reports.iter().filter(|r| r.is_fatal()).collect();
            for report in &fatal {
                if let LoopExit::Fatal(reason) = &report.exit {
                    tracing::error!(attribute = %report.attribute, reason = %reason, "비정상 종료된 루프");
                }
            }
            tracing::info!("=== 수집 루프 종료 ===");

            if !fatal.is_empty() {
                return Err(format!("{}개 루프가 비정상 종료됨", fatal.len()).into());
            }
        }
        Commands::Once { attribute } => {
            let outcome = scheduler.run_cycle(attribute, &shutdown).await?;
            outcome.stats.log_summary();

            println!("{} @ {}", attribute, outcome.timestamp.to_rfc3339());
            for (symbol, value) in &outcome.values {
                println!("  {:<6} {}", symbol, value);
            }
            for (symbol, reason) in &outcome.failures {
                println!("  {:<6} 실패: {}", symbol, reason);
            }
        }
        Commands::Report { .. } => {}
    }

    Ok(())
}

/// 보고서 조회 시작 시각.
fn report_since(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - chrono::Duration::days(i64::from(days))
}

async fn print_report(
    store: &dyn QuoteStore,
    since: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let history = summarize_history(store, since).await?;

    if history.is_empty() {
        println!("저장된 데이터가 없습니다 (since {})", since.to_rfc3339());
        return Ok(());
    }

    println!(
        "{:<6} {:>7} {:>12} {:>12} {:>12} {:>9} {:>8}  {}",
        "SYMBOL", "SAMPLES", "LATEST", "MIN", "MAX", "CHANGE%", "BAND%", "LOGO"
    );

    for entry in history {
        let dash = || "-".to_string();
        let (samples, latest, min, max, change) = match &entry.prices {
            Some(p) => (
                p.samples.to_string(),
                p.latest_price.to_string(),
                p.min_price.to_string(),
                p.max_price.to_string(),
                p.change_pct().map(|c| c.round_dp(2).to_string()).unwrap_or_else(dash),
            ),
            None => ("0".to_string(), dash(), dash(), dash(), dash()),
        };
        let band = entry
            .band_position()
            .map(|b| b.round_dp(1).to_string())
            .unwrap_or_else(dash);

        println!(
            "{:<6} {:>7} {:>12} {:>12} {:>12} {:>9} {:>8}  {}",
            entry.symbol,
            samples,
            latest,
            min,
            max,
            change,
            band,
            entry.logo_url.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Ctrl+C 또는 SIGTERM 수신 시 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("종료 신호 수신, 진행 중인 주기 정리 중...");
    shutdown.cancel();
}
