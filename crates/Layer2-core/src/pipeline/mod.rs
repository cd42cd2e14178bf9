//! Request Pipeline - 연결 하나에 대한 처리 흐름
//!
//! ```text
//! ParseRequest ──▶ CacheLookup ──hit──▶ ServeFromCache ──┐
//!      │                │                                │
//!      │               miss                              │
//!      │                ▼                                │
//!      │         NegotiateScheme (HEAD probe on https)   │
//!      │                ▼                                │
//!      │         Fetch (one redirect hop at most)        │
//!      │                ▼                                │
//!      │         StreamAndCache (tee: client + buffer)   │
//!      │                │                                │
//!      └───────────────▶┴──────────▶ closed ◀────────────┘
//! ```
//!
//! Each stage returns a [`PipelineResult`]. Any error ends the run: nothing more
//! is written, nothing is cached, and the client connection is shut down.

mod error;

pub use error::{PipelineError, PipelineResult};

use crate::origin::{Origin, OriginResponse};
use crate::request::ProxyRequest;
use crate::response::encode_head;
use crate::scheme::{Scheme, SchemeForms};
use bytes::{Bytes, BytesMut};
use cachet_foundation::{CacheStore, Error};
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// Default chunk size for client writes
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// How a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Request unreadable or unsupported; nothing written
    Closed,
    /// Replayed from the cache store
    Cached,
    /// Fetched live. `cached` is false for 4xx/5xx responses or when another
    /// writer stored the URL first.
    Fetched { cached: bool },
    /// Fetch or transfer failed; the response is empty or truncated
    Failed,
}

/// Per-connection request handling, sharing one [`CacheStore`]
pub struct Pipeline {
    store: Arc<CacheStore>,
    origin: Arc<dyn Origin>,
    buffer_size: usize,
}

impl Pipeline {
    pub fn new(store: Arc<CacheStore>, origin: Arc<dyn Origin>) -> Self {
        Self {
            store,
            origin,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Handle one client connection to completion.
    ///
    /// Never fails: every error degrades to an empty (or truncated) response
    /// followed by closing the connection.
    pub async fn serve<S>(&self, stream: S) -> ServeOutcome
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let conn_id = Uuid::new_v4().simple().to_string();
        let span = info_span!("conn", id = &conn_id[..8]);

        async move {
            let (reader, mut writer) = tokio::io::split(stream);
            let mut reader = BufReader::new(reader);

            let outcome = match self.run(&mut reader, &mut writer).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_request_error() => {
                    debug!("dropping connection: {}", e);
                    ServeOutcome::Closed
                }
                Err(e) if e.is_upstream() => {
                    warn!("upstream failure: {}", e);
                    ServeOutcome::Failed
                }
                Err(e) => {
                    debug!("client went away: {}", e);
                    ServeOutcome::Failed
                }
            };

            // best-effort close
            let _ = writer.shutdown().await;
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run<R, W>(&self, reader: &mut R, writer: &mut W) -> PipelineResult<ServeOutcome>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        // ParseRequest
        let request = ProxyRequest::read_from(reader).await?;
        debug!(request = request.request_line(), "request received");

        // CacheLookup
        let forms = SchemeForms::of(request.target())
            .ok_or_else(|| PipelineError::UnsupportedTarget(request.target().to_string()))?;
        if let Some(payload) = self.lookup(&forms) {
            self.serve_cached(&payload, writer).await?;
            info!(url = request.target(), bytes = payload.len(), "served from cache");
            return Ok(ServeOutcome::Cached);
        }

        // NegotiateScheme
        let scheme = self.negotiate(&forms).await;

        // Fetch
        let url = forms.for_scheme(scheme);
        let response = self.fetch(url, scheme).await?;

        // StreamAndCache
        let status = response.status;
        let cacheable = response.is_cacheable();
        let payload = self.stream_and_collect(response, writer).await?;
        let size = payload.len();
        let cached = cacheable && self.store.put_if_absent(forms.requested_key(), payload);
        info!(url, status, bytes = size, cached, "served from origin");

        Ok(ServeOutcome::Fetched { cached })
    }

    /// Both scheme forms are queried; the http form wins when both are cached.
    fn lookup(&self, forms: &SchemeForms) -> Option<Bytes> {
        let https = self.store.get(&forms.https);
        let http = self.store.get(&forms.http);
        http.or(https)
    }

    async fn negotiate(&self, forms: &SchemeForms) -> Scheme {
        if self.origin.probe(&forms.https).await {
            Scheme::Https
        } else {
            debug!(url = %forms.https, "https unavailable, falling back to http");
            Scheme::Http
        }
    }

    /// Open `url`, following at most one 301/302/303 hop. Under https the
    /// redirect target is upgraded to https as well.
    async fn fetch(&self, url: &str, scheme: Scheme) -> PipelineResult<OriginResponse> {
        let response = self
            .origin
            .fetch(url)
            .await
            .map_err(|e| PipelineError::fetch(url, e))?;

        if !response.is_redirect() {
            return Ok(response);
        }
        let Some(location) = response.location() else {
            return Ok(response);
        };

        let target = redirect_target(url, location, scheme).ok_or_else(|| {
            PipelineError::fetch(
                url,
                Error::InvalidInput(format!("redirect location {}", location)),
            )
        })?;
        drop(response);

        debug!(from = url, to = %target, "following redirect");
        self.origin
            .fetch(&target)
            .await
            .map_err(|e| PipelineError::fetch(target.as_str(), e))
    }

    /// Tee the response into the client socket and an accumulator.
    ///
    /// Returns the accumulated bytes only if the whole response was relayed.
    async fn stream_and_collect<W>(
        &self,
        mut response: OriginResponse,
        writer: &mut W,
    ) -> PipelineResult<Bytes>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let head = encode_head(response.status, response.reason.as_deref(), &response.headers);
        let mut accumulator = BytesMut::with_capacity(head.len() + self.buffer_size);

        writer
            .write_all(&head)
            .await
            .map_err(PipelineError::ClientWrite)?;
        accumulator.extend_from_slice(&head);

        while let Some(chunk) = response.body.next().await {
            let chunk = chunk.map_err(PipelineError::Stream)?;
            writer
                .write_all(&chunk)
                .await
                .map_err(PipelineError::ClientWrite)?;
            accumulator.extend_from_slice(&chunk);
        }

        writer.flush().await.map_err(PipelineError::ClientWrite)?;
        Ok(accumulator.freeze())
    }

    async fn serve_cached<W>(&self, payload: &Bytes, writer: &mut W) -> PipelineResult<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        for chunk in payload.chunks(self.buffer_size) {
            writer
                .write_all(chunk)
                .await
                .map_err(PipelineError::ClientWrite)?;
        }
        writer.flush().await.map_err(PipelineError::ClientWrite)
    }
}

/// Resolve `location` against `base`. An https session never drops to http;
/// under http the location's own scheme is kept. Non-http(s) targets are refused.
fn redirect_target(base: &str, location: &str, scheme: Scheme) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let mut target = base.join(location).ok()?;
    if target.scheme() != "http" && target.scheme() != "https" {
        return None;
    }
    if scheme == Scheme::Https {
        target.set_scheme(Scheme::Https.as_str()).ok()?;
    }
    Some(target.into())
}
