//! Core traits and types for the response cache.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::dto::ResponseEnvelope;
use crate::error::CacheError;

/// Trait for wire entities whose response envelopes can be cached.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Response kind name for storage organization (e.g., "season", "media")
  fn entity_type() -> &'static str;
}

/// Identifies which cached entity corresponds to a request.
pub trait QueryKey: Send + Sync {
  /// Stable, fixed-length storage key
  fn cache_hash(&self) -> String;

  /// Human-readable description, stored alongside the entry
  fn description(&self) -> String;
}

impl QueryKey for str {
  fn cache_hash(&self) -> String {
    self.to_string()
  }

  fn description(&self) -> String {
    self.to_string()
  }
}

impl QueryKey for String {
  fn cache_hash(&self) -> String {
    self.clone()
  }

  fn description(&self) -> String {
    self.clone()
  }
}

/// Persisted form of a response envelope: `status`, `results` and the
/// serialized `data` collection, plus the network completion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRecord {
  pub status: String,
  pub results: u32,
  pub data: Vec<u8>,
  pub fetched_at: DateTime<Utc>,
}

impl CachedRecord {
  pub fn from_envelope<T: Serialize>(
    envelope: &ResponseEnvelope<T>,
    fetched_at: DateTime<Utc>,
  ) -> Result<Self, CacheError> {
    let data = serde_json::to_vec(&envelope.data).map_err(|e| CacheError::Storage(e.to_string()))?;

    Ok(Self {
      status: envelope.status.clone(),
      results: envelope.results,
      data,
      fetched_at,
    })
  }

  pub fn to_envelope<T: DeserializeOwned>(&self) -> Result<ResponseEnvelope<T>, CacheError> {
    let data: Vec<T> = serde_json::from_slice(&self.data)
      .map_err(|e| CacheError::DeserializationFailed(e.to_string()))?;

    Ok(ResponseEnvelope {
      status: self.status.clone(),
      results: self.results,
      data,
    })
  }
}

/// A response envelope read back from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse<T> {
  pub envelope: ResponseEnvelope<T>,
  /// When the network delivered this response
  pub fetched_at: DateTime<Utc>,
}

/// Where delivered data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  /// Fresh data from network
  Network,
  /// Network unavailable, serving the last stored response
  Cache { fetched_at: DateTime<Utc> },
}

impl Source {
  pub fn is_cache(&self) -> bool {
    matches!(self, Source::Cache { .. })
  }
}

/// Data together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivered<T> {
  pub data: T,
  pub source: Source,
}

impl<T> Delivered<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: Source::Network,
    }
  }

  pub fn from_cache(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: Source::Cache { fetched_at },
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Delivered<U> {
    Delivered {
      data: f(self.data),
      source: self.source,
    }
  }
}
