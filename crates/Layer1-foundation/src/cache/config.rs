//! Cache store configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache store parameters
///
/// `ttl_secs == 0` disables expiry, `sweep_interval_secs == 0` disables the
/// background sweeper. The sweeper only runs when both are positive.
/// `max_items` is always enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStoreConfig {
    /// Idle time after which an entry may be swept (seconds)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Time between sweeps (seconds)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Maximum number of cached responses
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_ttl_secs() -> u64 {
    300
}
fn default_sweep_interval_secs() -> u64 {
    100
}
fn default_max_items() -> usize {
    10_000
}

impl Default for CacheStoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_items: default_max_items(),
        }
    }
}

impl CacheStoreConfig {
    pub fn new(ttl_secs: u64, sweep_interval_secs: u64, max_items: usize) -> Self {
        Self {
            ttl_secs,
            sweep_interval_secs,
            max_items,
        }
    }

    /// Capacity-only store: no expiry, no sweeper
    pub fn bounded(max_items: usize) -> Self {
        Self::new(0, 0, max_items)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Whether a background sweeper should be started
    pub fn sweeper_enabled(&self) -> bool {
        self.ttl_secs > 0 && self.sweep_interval_secs > 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(Error::config("cache maxItems must be greater than 0"));
        }
        Ok(())
    }

    /// 다른 설정과 병합 (other가 기본값이 아니면 우선)
    pub fn merge(&mut self, other: CacheStoreConfig) {
        if other.ttl_secs != default_ttl_secs() {
            self.ttl_secs = other.ttl_secs;
        }
        if other.sweep_interval_secs != default_sweep_interval_secs() {
            self.sweep_interval_secs = other.sweep_interval_secs;
        }
        if other.max_items != default_max_items() {
            self.max_items = other.max_items;
        }
    }
}
