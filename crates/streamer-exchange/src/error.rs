//! 시세 조회 에러 타입.

use thiserror::Error;

/// 시세 조회 관련 에러.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 2xx 이외의 HTTP 응답
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// 공급자가 모르는 심볼 (404)
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// 요청 한도 초과 (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 응답 본문 파싱 실패
    #[error("Parse error: {0}")]
    Parse(String),

    /// 응답 JSON에 필드 누락
    #[error("Missing field `{0}` in response")]
    MissingField(String),

    /// 형식은 맞지만 값이 모순된 응답 (예: 52주 고가 < 저가)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 요청 구성 에러 (잘못된 URL 등)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 재시도 횟수 소진
    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },

    /// 종료 신호로 취소됨
    #[error("Fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// 재시도 가능한 일시적 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_)
            | FetchError::Timeout(_)
            | FetchError::RateLimited
            | FetchError::Parse(_) => true,
            FetchError::Http { status, .. } => *status >= 500 || *status == 408,
            _ => false,
        }
    }

    /// 재시도해도 결과가 바뀌지 않는 영구 에러인지 확인.
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable() && !matches!(self, FetchError::Cancelled)
    }

    /// 권장 최소 재시도 대기 시간(밀리초).
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            FetchError::RateLimited => Some(1000),
            FetchError::Network(_) => Some(100),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(FetchError::Timeout("5s".into()).is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(FetchError::Parse("bad".into()).is_retryable());
        assert!(FetchError::Http {
            status: 503,
            message: String::new()
        }
        .is_retryable());

        assert!(FetchError::UnknownSymbol("ZZZZ".into()).is_permanent());
        assert!(FetchError::MissingField("url".into()).is_permanent());
        assert!(FetchError::InvalidData("high < low".into()).is_permanent());
        assert!(FetchError::Http {
            status: 400,
            message: String::new()
        }
        .is_permanent());
        assert!(!FetchError::Cancelled.is_retryable());
        assert!(!FetchError::Cancelled.is_permanent());
    }
}
