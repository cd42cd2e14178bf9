//! Origin - upstream 서버 접근 계층
//!
//! The pipeline talks to origins only through the [`Origin`] trait:
//! - `probe`: HEAD 요청으로 HTTPS 사용 가능 여부 확인
//! - `fetch`: GET 요청, 응답 본문은 스트림으로 전달
//!
//! Redirects are never followed here; the pipeline decides how many hops to take.

mod http;

pub use http::{HttpOrigin, DEFAULT_PROBE_TIMEOUT};

use async_trait::async_trait;
use bytes::Bytes;
use cachet_foundation::Result;
use futures::stream::BoxStream;
use std::fmt;

/// Response body as it arrives from the origin
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// One upstream response. Dropping it closes the upstream connection.
pub struct OriginResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: BodyStream,
}

impl OriginResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: BodyStream) -> Self {
        Self {
            status,
            reason: None,
            headers,
            body,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// First header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 301, 302 and 303 are followed (once); other 3xx are passed through
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303)
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Only 2xx and 3xx responses are stored; errors are relayed but not cached
    pub fn is_cacheable(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

impl fmt::Debug for OriginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Upstream access used by the pipeline
#[async_trait]
pub trait Origin: Send + Sync {
    /// Whether `url` answers a HEAD request with 200-399 in time.
    /// Any failure is `false`.
    async fn probe(&self, url: &str) -> bool;

    /// Open a GET request to `url` without following redirects
    async fn fetch(&self, url: &str) -> Result<OriginResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream::{self, StreamExt};

    fn response(status: u16, headers: &[(&str, &str)]) -> OriginResponse {
        let headers = headers
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        OriginResponse::new(status, headers, stream::empty().boxed())
    }

    #[test]
    fn test_redirect_statuses() {
        assert!(response(301, &[]).is_redirect());
        assert!(response(302, &[]).is_redirect());
        assert!(response(303, &[]).is_redirect());
        assert!(!response(307, &[]).is_redirect());
        assert!(!response(200, &[]).is_redirect());
    }

    #[test]
    fn test_cacheable_statuses() {
        assert!(response(200, &[]).is_cacheable());
        assert!(response(204, &[]).is_cacheable());
        assert!(response(302, &[]).is_cacheable());
        assert!(!response(404, &[]).is_cacheable());
        assert!(!response(503, &[]).is_cacheable());
        assert!(!response(101, &[]).is_cacheable());
    }

    #[test]
    fn test_location_lookup_is_case_insensitive() {
        let resp = response(301, &[("LOCATION", "http://example.org/new")]);
        assert_eq!(resp.location(), Some("http://example.org/new"));
        assert_eq!(resp.header("content-type"), None);
    }
}
