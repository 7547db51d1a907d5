//! tracing 기반 로깅 초기화.
//!
//! 출력 형식:
//! - **pretty**: 개발용 여러 줄 형식
//! - **json**: 로그 수집기용 JSON 한 줄 형식
//! - **compact**: 데몬 장기 실행용 한 줄 형식

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 수집기 로그 대상 crate.
pub const STREAMER_TARGETS: &[&str] = &[
    "streamer_core",
    "streamer_exchange",
    "streamer_data",
    "streamer_collector",
    "stock_streamer",
];

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 수집기 crate 들에 적용할 레벨 (예: "info", "debug")
    pub level: String,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn new(level: impl Into<String>, format: LogFormat) -> Self {
        Self {
            level: level.into(),
            format,
        }
    }

    /// `RUST_LOG` 미설정 시 사용할 필터 지시문.
    ///
    /// 수집기 crate 만 `level`로 올리고 나머지(sqlx, reqwest 등)는 warn 으로 둡니다.
    pub fn filter_directive(&self) -> String {
        let mut directive = String::from("warn");
        for target in STREAMER_TARGETS {
            directive.push_str(&format!(",{}={}", target, self.level));
        }
        directive
    }
}

/// 주어진 설정으로 로깅 시스템을 초기화합니다.
///
/// `RUST_LOG`가 설정되어 있으면 `config.level`보다 우선합니다.
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directive()))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, level = %config.level, "로깅 초기화 완료");
    Ok(())
}

/// 심볼/속성 필드가 포함된 수집 span을 생성하는 매크로.
#[macro_export]
macro_rules! fetch_span {
    ($name:expr, $symbol:expr) => {
        tracing::debug_span!($name, symbol = %$symbol)
    };
    ($name:expr, $symbol:expr, $attribute:expr) => {
        tracing::debug_span!($name, symbol = %$symbol, attribute = %$attribute)
    };
}
