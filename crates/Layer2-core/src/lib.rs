//! cachet-core: Request pipeline for Cachet
//!
//! Layer2 - 요청 처리 레이어
//!
//! # 주요 모듈
//!
//! - `request`: 클라이언트 요청 헤더 읽기 및 request line 파싱
//! - `scheme`: http/https URL 형태 변환 (캐시 키 두 개)
//! - `origin`: upstream 접근 trait 및 reqwest 구현
//! - `response`: 응답 head 직렬화 (hop-by-hop 헤더 제거)
//! - `pipeline`: 연결 단위 처리 흐름 (lookup → probe → fetch → tee)
//!
//! # 사용 예시
//!
//! ```ignore
//! use cachet_core::{HttpOrigin, Pipeline};
//! use cachet_foundation::{CacheStore, CacheStoreConfig};
//!
//! let store = Arc::new(CacheStore::new(CacheStoreConfig::default())?);
//! let _sweeper = store.spawn_sweeper();
//! let pipeline = Arc::new(Pipeline::new(store, Arc::new(HttpOrigin::new()?)));
//!
//! let (socket, _) = listener.accept().await?;
//! tokio::spawn(async move { pipeline.serve(socket).await });
//! ```

pub mod origin;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod scheme;

// Re-exports: Pipeline
pub use pipeline::{Pipeline, PipelineError, PipelineResult, ServeOutcome, DEFAULT_BUFFER_SIZE};

// Re-exports: Origin
pub use origin::{BodyStream, HttpOrigin, Origin, OriginResponse, DEFAULT_PROBE_TIMEOUT};

// Re-exports: Request / Scheme
pub use request::{ProxyRequest, MAX_HEADER_BYTES};
pub use scheme::{Scheme, SchemeForms};
