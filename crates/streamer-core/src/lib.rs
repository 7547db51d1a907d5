//! StockStreamer 핵심 도메인 타입.
//!
//! 이 crate는 수집 파이프라인 전체에서 공유하는 타입을 정의합니다:
//! - `Symbol` - 추적 대상 티커
//! - `PriceObservation`, `LogoReference`, `HighLowRange` - 저장 단위 레코드
//! - `Attribute` - 수집 속성 (가격, 로고, 52주 고/저)
//! - 구조화 로깅 초기화

pub mod error;
pub mod logging;
pub mod types;

pub use error::{CoreError, Result};
pub use types::*;
