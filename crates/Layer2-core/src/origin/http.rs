//! reqwest-backed origin

use super::{Origin, OriginResponse};
use async_trait::async_trait;
use cachet_foundation::{Error, Result};
use futures::StreamExt;
use reqwest::{redirect, Client};
use std::time::Duration;
use tracing::debug;

/// Default HTTPS probe timeout (connect and read)
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

const USER_AGENT: &str = concat!("cachet/", env!("CARGO_PKG_VERSION"));

/// Origin access over the network.
///
/// Uses two clients: a probe client bounded by the probe timeout, and a fetch
/// client with no timeout at all. Neither follows redirects or honors proxy
/// environment variables.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    probe_client: Client,
    fetch_client: Client,
    probe_timeout: Duration,
}

impl HttpOrigin {
    pub fn new() -> Result<Self> {
        Self::with_probe_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_probe_timeout(probe_timeout: Duration) -> Result<Self> {
        let probe_client = Client::builder()
            .connect_timeout(probe_timeout)
            .timeout(probe_timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build probe client: {}", e)))?;

        let fetch_client = Client::builder()
            .redirect(redirect::Policy::none())
            .no_proxy()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build fetch client: {}", e)))?;

        Ok(Self {
            probe_client,
            fetch_client,
            probe_timeout,
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn probe(&self, url: &str) -> bool {
        match self.probe_client.head(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(url, status, "probe answered");
                (200..=399).contains(&status)
            }
            Err(e) => {
                debug!(url, error = %e, timeout = e.is_timeout(), "probe failed");
                false
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<OriginResponse> {
        let response = self.fetch_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(e.to_string())
            } else {
                Error::Http(e.to_string())
            }
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::Http(e.to_string())))
            .boxed();

        let mut origin_response = OriginResponse::new(status.as_u16(), headers, body);
        if let Some(reason) = status.canonical_reason() {
            origin_response = origin_response.with_reason(reason);
        }
        Ok(origin_response)
    }
}
