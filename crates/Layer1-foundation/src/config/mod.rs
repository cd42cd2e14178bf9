//! Config - 통합 설정 관리
//!
//! - `proxy.rs` - ProxyConfig 통합 설정 (listen / cache / pipeline)

mod proxy;

pub use proxy::{ListenConfig, PipelineSettings, ProxyConfig, PROXY_CONFIG_FILE};
