//! 시세 공급자(vendor) 클라이언트.
//!
//! - `MarketDataClient` - 심볼/속성 단위 단일 요청 인터페이스
//! - `IexClient` - IEX 호환 REST API 구현
//! - `RetryPolicy` / `retry_fetch` - 에러 분류 기반 제한 재시도

pub mod error;
pub mod iex;
pub mod retry;
pub mod traits;
pub mod vendor;

pub use error::FetchError;
pub use iex::IexClient;
pub use retry::{retry_fetch, RetryPolicy};
pub use traits::MarketDataClient;
pub use vendor::{create_client, ClientSettings, MarketDataVendor};
