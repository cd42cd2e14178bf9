//! Cachet CLI - Main entry point

mod server;

use anyhow::Context;
use cachet_core::{HttpOrigin, Pipeline};
use cachet_foundation::{CacheStore, ProxyConfig};
use clap::Parser;
use server::Server;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cachet - forward caching HTTP proxy
#[derive(Parser, Debug)]
#[command(name = "cachet")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (replaces global and project proxy.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Entry time-to-live in seconds (0 disables expiry)
    #[arg(long)]
    ttl: Option<u64>,

    /// Sweep interval in seconds (0 disables the sweeper)
    #[arg(long)]
    sweep_interval: Option<u64>,

    /// Maximum number of cached responses
    #[arg(long)]
    max_items: Option<usize>,

    /// Concurrent connection ceiling (0 = unbounded)
    #[arg(long)]
    max_connections: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// CLI 플래그가 설정 파일 값보다 우선
    fn apply(&self, config: &mut ProxyConfig) {
        if let Some(bind) = &self.bind {
            config.listen.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(max_connections) = self.max_connections {
            config.listen.max_connections = max_connections;
        }
        if let Some(ttl) = self.ttl {
            config.cache.ttl_secs = ttl;
        }
        if let Some(interval) = self.sweep_interval {
            config.cache.sweep_interval_secs = interval;
        }
        if let Some(max_items) = self.max_items {
            config.cache.max_items = max_items;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => ProxyConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ProxyConfig::load().context("failed to load proxy config")?,
    };
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    // Cache store + sweeper
    let store = Arc::new(CacheStore::new(config.cache.clone())?);
    let sweeper = store.spawn_sweeper();
    info!(
        ttl_secs = config.cache.ttl_secs,
        sweep_interval_secs = config.cache.sweep_interval_secs,
        max_items = config.cache.max_items,
        sweeper = sweeper.is_some(),
        "cache store ready"
    );

    // Pipeline
    let origin = HttpOrigin::with_probe_timeout(config.pipeline.probe_timeout())?;
    let pipeline = Arc::new(
        Pipeline::new(store.clone(), Arc::new(origin)).with_buffer_size(config.pipeline.buffer_size),
    );

    // Listener
    let server = Server::bind(&config.listen).await?;
    server
        .run(pipeline, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }

    let stats = store.stats();
    info!(
        entries = stats.entries,
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        expirations = stats.expirations,
        "shutdown complete"
    );
    Ok(())
}
