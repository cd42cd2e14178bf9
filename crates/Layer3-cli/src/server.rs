//! TCP listener - 연결마다 pipeline task 하나

use anyhow::Context;
use cachet_core::Pipeline;
use cachet_foundation::ListenConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

pub struct Server {
    listener: TcpListener,
    /// `None` when connections are unbounded
    limiter: Option<Arc<Semaphore>>,
}

impl Server {
    pub async fn bind(config: &ListenConfig) -> anyhow::Result<Self> {
        let address = config.address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        let limiter = (config.max_connections > 0)
            .then(|| Arc::new(Semaphore::new(config.max_connections)));

        info!(
            address = %listener.local_addr()?,
            max_connections = config.max_connections,
            "listening"
        );
        Ok(Self { listener, limiter })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept until `shutdown` resolves. In-flight connections are left to
    /// finish on their own.
    pub async fn run<F>(self, pipeline: Arc<Pipeline>, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let permit = match &self.limiter {
                Some(limiter) => tokio::select! {
                    _ = &mut shutdown => break,
                    permit = limiter.clone().acquire_owned() => {
                        Some(permit.context("connection limiter closed")?)
                    }
                },
                None => None,
            };

            let (socket, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        // EMFILE 등: 잠깐 쉬고 재시도
                        warn!("accept failed: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
            };

            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                let outcome = pipeline.serve(socket).await;
                debug!(%peer, ?outcome, "connection closed");
                drop(permit);
            });
        }

        info!("listener stopped");
        Ok(())
    }
}
