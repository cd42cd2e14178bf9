//! Client request header parsing
//!
//! Only the request line matters to the proxy. Header lines are read up to the
//! first blank line so the socket is positioned past them, then kept verbatim.

use crate::pipeline::{PipelineError, PipelineResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Upper bound on the request line plus headers
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// One client request, owned by a single pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    request_line: String,
    method: String,
    target: String,
    version: Option<String>,
    headers: Vec<String>,
}

impl ProxyRequest {
    /// Parse a request line such as `GET http://example.com/ HTTP/1.1`.
    ///
    /// The target is the second whitespace-delimited token.
    pub fn parse_request_line(line: &str) -> PipelineResult<Self> {
        let mut tokens = line.split_whitespace();
        let method = tokens
            .next()
            .ok_or_else(|| PipelineError::MalformedRequest("empty request line".to_string()))?;
        let target = tokens.next().ok_or_else(|| {
            PipelineError::MalformedRequest(format!("no target in request line: {:.80}", line))
        })?;
        let version = tokens.next().map(str::to_string);

        Ok(Self {
            request_line: line.to_string(),
            method: method.to_string(),
            target: target.to_string(),
            version,
            headers: Vec::new(),
        })
    }

    /// Read the request header from the client, stopping at the first blank
    /// line or EOF.
    pub async fn read_from<R>(reader: &mut R) -> PipelineResult<Self>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut limited = AsyncReadExt::take(&mut *reader, MAX_HEADER_BYTES as u64);
        let mut lines = Vec::new();

        loop {
            let mut raw = Vec::new();
            let n = limited
                .read_until(b'\n', &mut raw)
                .await
                .map_err(PipelineError::ClientRead)?;
            if n == 0 {
                break;
            }
            if !raw.ends_with(b"\n") && limited.limit() == 0 {
                return Err(PipelineError::MalformedRequest(format!(
                    "request header exceeds {} bytes",
                    MAX_HEADER_BYTES
                )));
            }

            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
            if line.trim().is_empty() {
                break;
            }
            lines.push(line.to_string());
        }

        let mut lines = lines.into_iter();
        let first = lines
            .next()
            .ok_or_else(|| PipelineError::MalformedRequest("empty request".to_string()))?;
        let mut request = Self::parse_request_line(&first)?;
        request.headers = lines.collect();
        Ok(request)
    }

    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Requested URL as sent by the client
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Raw header lines after the request line
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}
