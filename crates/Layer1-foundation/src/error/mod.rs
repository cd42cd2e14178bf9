//! Error types for Cachet
//!
//! Foundation 에러. Pipeline 단계 에러는 cachet-core `PipelineError` 참고

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Cachet 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // 설정 파일 / 설정 값
    #[error("Invalid proxy config: {0}")]
    Config(String),

    // 요청 대상이 처리 불가 (redirect location 등)
    #[error("Unusable target: {0}")]
    InvalidInput(String),

    // ========================================================================
    // Origin 통신
    // ========================================================================
    #[error("Origin request failed: {0}")]
    Http(String),

    #[error("Origin timed out: {0}")]
    Timeout(String),
}

impl Error {
    /// origin 연결 단계의 실패
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Timeout(_))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}
