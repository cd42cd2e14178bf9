//! Proxy Config - 통합 설정
//!
//! 글로벌(`<config_dir>/cachet/proxy.json`) + 프로젝트(`.cachet/proxy.json`) 병합

use crate::cache::CacheStoreConfig;
use crate::storage::{read_json, JsonStore};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 설정 파일명
pub const PROXY_CONFIG_FILE: &str = "proxy.json";

// ============================================================================
// Proxy Config (통합)
// ============================================================================

/// Cachet 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Listener 설정
    #[serde(default)]
    pub listen: ListenConfig,

    /// Cache store 설정
    #[serde(default)]
    pub cache: CacheStoreConfig,

    /// Request pipeline 설정
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.read::<ProxyConfig>(PROXY_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) = project.read::<ProxyConfig>(PROXY_CONFIG_FILE)? {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    /// 지정한 파일 하나만 로드
    pub fn load_from(path: &Path) -> Result<Self> {
        read_json(path)
    }

    // ========================================================================
    // Merge / Validate
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    ///
    /// Field-wise: a field of `other` wins only when it differs from the
    /// built-in default, so a later layer cannot reset a value back to its
    /// default. CLI flags (applied after loading) can.
    pub fn merge(&mut self, other: ProxyConfig) {
        self.listen.merge(other.listen);
        self.cache.merge(other.cache);
        self.pipeline.merge(other.pipeline);
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.pipeline.validate()
    }
}

// ============================================================================
// Listen Config
// ============================================================================

/// Listener 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenConfig {
    /// Bind 주소
    #[serde(default = "default_bind")]
    pub bind: String,

    /// 포트
    #[serde(default = "default_port")]
    pub port: u16,

    /// 동시 연결 상한 (0 = 무제한)
    #[serde(default)]
    pub max_connections: usize,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_connections: 0,
        }
    }
}

impl ListenConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// 기본값이 아닌 필드만 덮어씀
    pub fn merge(&mut self, other: ListenConfig) {
        if other.bind != default_bind() {
            self.bind = other.bind;
        }
        if other.port != default_port() {
            self.port = other.port;
        }
        if other.max_connections != 0 {
            self.max_connections = other.max_connections;
        }
    }
}

// ============================================================================
// Pipeline Settings
// ============================================================================

/// Request pipeline 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Chunk size for client writes (bytes)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// HTTPS probe connect/read timeout (milliseconds)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl PipelineSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// 기본값이 아닌 필드만 덮어씀
    pub fn merge(&mut self, other: PipelineSettings) {
        if other.buffer_size != default_buffer_size() {
            self.buffer_size = other.buffer_size;
        }
        if other.probe_timeout_ms != default_probe_timeout_ms() {
            self.probe_timeout_ms = other.probe_timeout_ms;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::config("pipeline bufferSize must be greater than 0"));
        }
        if self.probe_timeout_ms == 0 {
            return Err(Error::config(
                "pipeline probeTimeoutMs must be greater than 0",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    7538
}
fn default_buffer_size() -> usize {
    32 * 1024
}
fn default_probe_timeout_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.listen.address(), "0.0.0.0:7538");
        assert_eq!(config.cache.max_items, 10_000);
        assert_eq!(config.pipeline.buffer_size, 32768);
        assert_eq!(config.pipeline.probe_timeout(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_camel_case_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROXY_CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{
                "listen": { "port": 9000, "maxConnections": 64 },
                "cache": { "ttlSecs": 60, "sweepIntervalSecs": 10, "maxItems": 500 },
                "pipeline": { "probeTimeoutMs": 250 }
            }"#,
        )
        .unwrap();

        let config = ProxyConfig::load_from(&path).unwrap();
        assert_eq!(config.listen.port, 9000);
        assert_eq!(config.listen.bind, "0.0.0.0");
        assert_eq!(config.listen.max_connections, 64);
        assert_eq!(config.cache, CacheStoreConfig::new(60, 10, 500));
        assert_eq!(config.pipeline.probe_timeout_ms, 250);
        assert_eq!(config.pipeline.buffer_size, 32768);
    }

    #[test]
    fn test_merge_prefers_non_default() {
        let mut global = ProxyConfig::default();
        global.listen.port = 8000;
        global.cache.max_items = 50;

        let mut project = ProxyConfig::default();
        project.cache.ttl_secs = 30;

        let mut merged = ProxyConfig::default();
        merged.merge(global);
        merged.merge(project);

        assert_eq!(merged.listen.port, 8000);
        assert_eq!(merged.cache.max_items, 50);
        assert_eq!(merged.cache.ttl_secs, 30);
        assert_eq!(merged.cache.sweep_interval_secs, 100);
    }

    #[test]
    fn test_merge_keeps_override_when_later_layer_uses_default() {
        let mut global = ProxyConfig::default();
        global.listen.port = 8000;
        global.pipeline.probe_timeout_ms = 250;

        // project file spells out the defaults explicitly
        let project: ProxyConfig = serde_json::from_str(
            r#"{ "listen": { "port": 7538 }, "pipeline": { "probeTimeoutMs": 1000 } }"#,
        )
        .unwrap();

        let mut merged = ProxyConfig::default();
        merged.merge(global);
        merged.merge(project);

        assert_eq!(merged.listen.port, 8000);
        assert_eq!(merged.pipeline.probe_timeout_ms, 250);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = ProxyConfig::default();
        config.cache.max_items = 0;
        assert!(config.validate().is_err());

        let mut config = ProxyConfig::default();
        config.pipeline.buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = ProxyConfig::default();
        config.pipeline.probe_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProxyConfig::load_from(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
