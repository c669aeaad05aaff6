//! Response cache: the last successful response per query, for offline reads.
//!
//! This module is backend-agnostic:
//! - Stores one record per (response kind, query key), upsert semantics
//! - Treats undeserializable entries as misses rather than errors
//! - Keeps the newest network completion when writers race on a key
//! - Has no TTL; staleness is decided by the transfer service

mod storage;
mod traits;

pub use storage::{MemoryStorage, NoopStorage, ResponseStorage, SqliteStorage};
pub use traits::{CachedRecord, CachedResponse, Cacheable, Delivered, QueryKey, Source};
