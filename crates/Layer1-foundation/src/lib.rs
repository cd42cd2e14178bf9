//! # cachet-foundation
//!
//! Foundation layer for Cachet:
//! - Error: 공통 에러 타입
//! - Cache: 동시 접근 가능한 응답 캐시 (LRU + TTL sweeper)
//! - Config: 통합 설정 (ProxyConfig)
//! - Storage: JSON 설정 파일 로드
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Listener (cachet-cli)                                   │
//! │        │ one task per connection                         │
//! │        ▼                                                 │
//! │  Pipeline (cachet-core) ──── Origin (HTTP / HTTPS)       │
//! │        │                                                 │
//! │        ▼                                                 │
//! │  CacheStore (this crate, shared via Arc)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Cache (캐시 시스템)
// ============================================================================
pub use cache::{CacheEntry, CacheStore, CacheStoreConfig, CacheStoreStats, LruMap, SweeperHandle};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{ListenConfig, PipelineSettings, ProxyConfig, PROXY_CONFIG_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;
