//! StockStreamer 수집기.
//!
//! 세 개의 독립 주기 루프가 시세를 수집하여 저장소에 기록합니다:
//! - 가격: 짧은 주기(초 단위), append-only
//! - 로고 URL: 긴 주기(시간 단위), 심볼당 1행 교체
//! - 52주 고/저: 긴 주기(시간 단위), 심볼당 1행 교체

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::{CycleStats, LoopExit, LoopReport};
