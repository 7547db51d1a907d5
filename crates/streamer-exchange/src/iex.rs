//! IEX 호환 REST API 클라이언트.
//!
//! # 엔드포인트
//!
//! - `GET {base}/{symbol}/price` → 숫자 텍스트 (예: `150.23`)
//! - `GET {base}/{symbol}/logo` → `{"url": "..."}`
//! - `GET {base}/{symbol}/quote` → `{"week52High": 182.9, "week52Low": 124.2, ...}`
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use streamer_exchange::IexClient;
//!
//! let client = IexClient::new("https://api.iextrading.com/1.0/stock", Duration::from_secs(5))?;
//! let price = client.fetch_price(&Symbol::new("AAPL")?).await?;
//! ```

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::Value;
use streamer_core::{HighLow, Symbol};
use tracing::trace;

use crate::{FetchError, MarketDataClient};

/// 에러 메시지에 포함할 응답 본문 최대 길이.
const MAX_ERROR_BODY: usize = 200;

/// IEX 호환 시세 클라이언트.
#[derive(Clone)]
pub struct IexClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl IexClient {
    /// 새 클라이언트 생성.
    ///
    /// `timeout`은 요청 1건(연결 + 응답 수신) 전체에 적용됩니다.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| FetchError::InvalidRequest(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// API 토큰 설정 (`token` 쿼리 파라미터로 전송).
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// 기본 URL 반환.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, symbol: &Symbol, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, symbol, endpoint)
    }

    /// 단일 GET 요청 후 본문 텍스트 반환.
    async fn get_text(&self, symbol: &Symbol, endpoint: &str) -> Result<String, FetchError> {
        let url = self.endpoint_url(symbol, endpoint);
        trace!(%url, "시세 요청");

        let mut request = self.client.get(&url);
        if let Some(ref token) = self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        match status {
            StatusCode::NOT_FOUND => Err(FetchError::UnknownSymbol(symbol.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(FetchError::Http {
                    status: status.as_u16(),
                    message: truncate(body.trim(), MAX_ERROR_BODY),
                })
            }
        }
    }

    async fn get_json(&self, symbol: &Symbol, endpoint: &str) -> Result<Value, FetchError> {
        let body = self.get_text(symbol, endpoint).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl MarketDataClient for IexClient {
    fn vendor(&self) -> &str {
        "iex"
    }

    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal, FetchError> {
        let body = self.get_text(symbol, "price").await?;
        parse_price(&body)
    }

    async fn fetch_high_low(&self, symbol: &Symbol) -> Result<HighLow, FetchError> {
        let quote = self.get_json(symbol, "quote").await?;
        let high = decimal_field(&quote, "week52High")?;
        let low = decimal_field(&quote, "week52Low")?;
        HighLow::new(symbol, high, low).map_err(|e| FetchError::InvalidData(e.to_string()))
    }

    async fn fetch_logo_url(&self, symbol: &Symbol) -> Result<String, FetchError> {
        let logo = self.get_json(symbol, "logo").await?;
        match logo.get("url").and_then(Value::as_str) {
            Some(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
            _ => Err(FetchError::MissingField("url".to_string())),
        }
    }
}

/// 가격 본문 파싱 (첫 줄의 숫자 텍스트).
pub fn parse_price(body: &str) -> Result<Decimal, FetchError> {
    let line = body.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return Err(FetchError::Parse("empty price body".to_string()));
    }
    parse_decimal(line).ok_or_else(|| FetchError::Parse(format!("invalid price: {}", line)))
}

/// JSON 객체에서 숫자 필드를 Decimal로 추출.
///
/// 숫자와 숫자 문자열을 모두 허용합니다. 값이 `null`이면 누락으로 처리합니다.
fn decimal_field(value: &Value, field: &str) -> Result<Decimal, FetchError> {
    let raw = match value.get(field) {
        None | Some(Value::Null) => return Err(FetchError::MissingField(field.to_string())),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => {
            return Err(FetchError::Parse(format!(
                "field `{}` is not numeric: {}",
                field, other
            )))
        }
    };

    parse_decimal(&raw)
        .ok_or_else(|| FetchError::Parse(format!("field `{}` is not numeric: {}", field, raw)))
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
