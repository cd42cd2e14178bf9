//! Pipeline stage errors
//!
//! Every stage returns one of these instead of swallowing failures. `serve`
//! inspects them and applies the single policy: log, write nothing more, close.

use cachet_foundation::Error as FoundationError;
use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Client socket failed while the request header was being read
    #[error("Client read failed: {0}")]
    ClientRead(#[source] std::io::Error),

    /// Empty input, missing target token, or oversized header
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Target is not an absolute http:// or https:// URL
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    /// Origin unreachable or failed before any byte reached the client
    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FoundationError,
    },

    /// Origin body failed mid-transfer
    #[error("Origin stream failed: {0}")]
    Stream(#[source] FoundationError),

    /// Client went away while the response was being written
    #[error("Client write failed: {0}")]
    ClientWrite(#[source] std::io::Error),
}

impl PipelineError {
    pub fn fetch(url: impl Into<String>, source: FoundationError) -> Self {
        PipelineError::Fetch {
            url: url.into(),
            source,
        }
    }

    /// The request never got far enough to talk to an origin
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            PipelineError::ClientRead(_)
                | PipelineError::MalformedRequest(_)
                | PipelineError::UnsupportedTarget(_)
        )
    }

    /// Failure on the origin side (fetch or body)
    pub fn is_upstream(&self) -> bool {
        matches!(self, PipelineError::Fetch { .. } | PipelineError::Stream(_))
    }
}
