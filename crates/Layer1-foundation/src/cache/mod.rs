//! # Cachet Cache Store
//!
//! A bounded, concurrently-accessed map from normalized URL to the full response
//! bytes first served for it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CacheStore (Arc, shared by every connection)                 │
//! │  ┌───────────────────────────────────────────────┐           │
//! │  │ Mutex<StoreState>                              │           │
//! │  │   LruMap<url, CacheEntry>  ── capacity evict   │           │
//! │  │   counters (hits / misses / evictions / ...)   │           │
//! │  └───────────────────────────────────────────────┘           │
//! │                     ▲                                         │
//! │                     │ scan, then remove one key per lock      │
//! │              Sweeper task (interval, stop signal)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - Size is bounded by `max_items`; the least recently used entry goes first.
//! - Time-based expiry is done by the sweeper only, so it is eventual.
//!
//! ```rust,ignore
//! use cachet_foundation::cache::{CacheStore, CacheStoreConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(CacheStore::new(CacheStoreConfig::new(300, 100, 10_000))?);
//! let sweeper = store.spawn_sweeper();
//!
//! store.put("http://example.com/", response_bytes);
//! if let Some(payload) = store.get("http://example.com/") {
//!     // replay payload
//! }
//! ```

mod config;
mod lru;
mod store;
mod sweeper;

pub use config::CacheStoreConfig;
pub use lru::LruMap;
pub use store::{CacheEntry, CacheStore, CacheStoreStats};
pub use sweeper::SweeperHandle;
