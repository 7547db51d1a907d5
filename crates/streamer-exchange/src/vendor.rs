//! 설정 기반 공급자 선택.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{FetchError, IexClient, MarketDataClient};

/// 지원 시세 공급자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarketDataVendor {
    /// IEX 호환 REST API
    #[default]
    Iex,
}

impl fmt::Display for MarketDataVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketDataVendor::Iex => write!(f, "iex"),
        }
    }
}

impl FromStr for MarketDataVendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "iex" | "iextrading" => Ok(MarketDataVendor::Iex),
            _ => Err(format!("Unknown market data vendor: {}", s)),
        }
    }
}

/// 클라이언트 생성 파라미터.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub vendor: MarketDataVendor,
    pub base_url: String,
    pub token: Option<String>,
    /// 요청 1건 타임아웃
    pub request_timeout: Duration,
}

/// 설정된 공급자의 클라이언트를 생성합니다.
pub fn create_client(settings: &ClientSettings) -> Result<Arc<dyn MarketDataClient>, FetchError> {
    match settings.vendor {
        MarketDataVendor::Iex => {
            let client = IexClient::new(settings.base_url.clone(), settings.request_timeout)?
                .with_token(settings.token.clone());
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_from_str() {
        assert_eq!("IEX".parse::<MarketDataVendor>().unwrap(), MarketDataVendor::Iex);
        assert!("bloomberg".parse::<MarketDataVendor>().is_err());
    }

    #[test]
    fn test_create_client() {
        let settings = ClientSettings {
            vendor: MarketDataVendor::Iex,
            base_url: "http://localhost:9000/stock".to_string(),
            token: None,
            request_timeout: Duration::from_secs(1),
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.vendor(), "iex");
    }
}
