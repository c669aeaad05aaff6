//! Data transfer service: network fetch with cache fallback.
//!
//! 1. Dispatch to the network client
//! 2. On success, persist the envelope in the background and deliver it
//! 3. On failure, serve the last stored envelope for the query key if there
//!    is one, otherwise deliver the network error
//!
//! The background cache write is issued as soon as the response arrives. A
//! caller cancelling after that point suppresses the delivery but not the
//! write.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::cache::{CachedRecord, CachedResponse, Cacheable, Delivered, QueryKey, ResponseStorage};
use crate::cancel::Call;
use crate::dto::{ResponseEnvelope, ToDomain};
use crate::error::{CacheError, NetworkError, TransferError};
use crate::network::{Endpoint, NetworkClient, NetworkSession};

/// Outcome of a cached request at the DTO level.
pub type TransferResult<T> = Result<Delivered<ResponseEnvelope<T>>, TransferError>;

/// Composes the network client with the response cache.
pub struct DataTransferService<N: NetworkSession, S: ResponseStorage> {
  network: NetworkClient<N>,
  storage: Arc<S>,
  /// Cached entries older than this are ignored on fallback
  max_fallback_age: Option<Duration>,
  /// Bumped by every eviction. Background writes started under an older
  /// generation are dropped.
  generation: Arc<RwLock<u64>>,
}

impl<N: NetworkSession, S: ResponseStorage> DataTransferService<N, S> {
  pub fn new(network: NetworkClient<N>, storage: Arc<S>) -> Self {
    Self {
      network,
      storage,
      max_fallback_age: None,
      generation: Arc::new(RwLock::new(0)),
    }
  }

  /// Refuse to serve cache entries older than `max_age` when the network fails.
  pub fn with_max_fallback_age(mut self, max_age: Duration) -> Self {
    self.max_fallback_age = Some(max_age);
    self
  }

  pub fn storage(&self) -> &Arc<S> {
    &self.storage
  }

  fn is_too_old(&self, fetched_at: DateTime<Utc>) -> bool {
    self
      .max_fallback_age
      .is_some_and(|max_age| Utc::now() - fetched_at > max_age)
  }

  /// Fetch an envelope, falling back to the cache on network failure.
  pub async fn fetch<T, K>(
    &self,
    endpoint: &Endpoint<ResponseEnvelope<T>>,
    key: &K,
  ) -> TransferResult<T>
  where
    T: Cacheable,
    K: QueryKey + ?Sized,
  {
    match self.network.fetch(endpoint).await {
      Ok(envelope) => {
        if !envelope.is_consistent() {
          warn!(
            path = endpoint.path(),
            results = envelope.results,
            len = envelope.data.len(),
            "response results count does not match payload"
          );
        }
        self.persist(key, &envelope);
        Ok(Delivered::from_network(envelope))
      }
      Err(NetworkError::Cancelled) => Err(NetworkError::Cancelled.into()),
      Err(error) => match self.read_fallback::<T>(key.cache_hash()).await {
        Some(cached) => {
          warn!(
            key = %key.description(),
            error = %error,
            fetched_at = %cached.fetched_at,
            "network failed, serving cached response"
          );
          Ok(Delivered::from_cache(cached.envelope, cached.fetched_at))
        }
        None => {
          debug!(key = %key.description(), error = %error, "network failed, no cached response");
          Err(TransferError::Network(error))
        }
      },
    }
  }

  /// Fetch without touching the cache (requests carrying credentials).
  pub async fn fetch_uncached<R>(&self, endpoint: &Endpoint<R>) -> Result<R, TransferError> {
    Ok(self.network.fetch(endpoint).await?)
  }

  /// Background variant of [`fetch`](Self::fetch) delivering the envelope.
  pub fn request_dto<T, K>(&self, endpoint: Endpoint<ResponseEnvelope<T>>, key: K) -> Call<TransferResult<T>>
  where
    T: Cacheable,
    K: QueryKey + 'static,
  {
    let service = self.clone();
    Call::spawn(async move { service.fetch(&endpoint, &key).await })
  }

  /// Background variant of [`fetch`](Self::fetch) delivering domain models.
  pub fn request<T, K>(
    &self,
    endpoint: Endpoint<ResponseEnvelope<T>>,
    key: K,
  ) -> Call<Result<Delivered<Vec<T::Domain>>, TransferError>>
  where
    T: Cacheable + ToDomain,
    T::Domain: Send + 'static,
    K: QueryKey + 'static,
  {
    let service = self.clone();
    Call::spawn(async move {
      service
        .fetch(&endpoint, &key)
        .await
        .map(|delivered| delivered.map(|envelope| envelope.to_domain()))
    })
  }

  pub fn request_uncached<R>(&self, endpoint: Endpoint<R>) -> Call<Result<R, TransferError>>
  where
    R: Send + 'static,
  {
    let service = self.clone();
    Call::spawn(async move { service.fetch_uncached(&endpoint).await })
  }

  /// Synchronous cache read, regardless of age.
  pub fn cached<T, K>(&self, key: &K) -> Option<CachedResponse<T>>
  where
    T: Cacheable,
    K: QueryKey + ?Sized,
  {
    self.storage.read::<T, K>(key)
  }

  /// Evict every stored response. Writes for responses that arrived
  /// before the eviction never land afterwards.
  pub fn clear_cache(&self) -> Result<(), CacheError> {
    let mut generation = self.generation_mut();
    *generation += 1;
    self.storage.clear()
  }

  fn generation(&self) -> RwLockReadGuard<'_, u64> {
    self
      .generation
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn generation_mut(&self) -> RwLockWriteGuard<'_, u64> {
    self
      .generation
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  async fn read_fallback<T: Cacheable>(&self, key_hash: String) -> Option<CachedResponse<T>> {
    let storage = Arc::clone(&self.storage);
    let cached = tokio::task::spawn_blocking(move || storage.read::<T, str>(&key_hash))
      .await
      .unwrap_or_else(|e| {
        warn!(error = %e, "cache read task failed");
        None
      })?;

    if self.is_too_old(cached.fetched_at) {
      debug!(fetched_at = %cached.fetched_at, "cached response too old for fallback");
      return None;
    }
    Some(cached)
  }

  /// Fire-and-forget write. Failures are logged, never surfaced.
  fn persist<T, K>(&self, key: &K, envelope: &ResponseEnvelope<T>)
  where
    T: Cacheable,
    K: QueryKey + ?Sized,
  {
    let record = match CachedRecord::from_envelope(envelope, Utc::now()) {
      Ok(record) => record,
      Err(e) => {
        warn!(key = %key.description(), error = %e, "failed to serialize response for cache");
        return;
      }
    };

    let service = self.clone();
    let started_in = *self.generation();
    let key_hash = key.cache_hash();
    let description = key.description();
    tokio::task::spawn_blocking(move || {
      // Held across the save so an eviction cannot slip in between
      let generation = service.generation();
      if *generation != started_in {
        debug!(key = %description, "cache cleared since response arrived, dropping write");
        return;
      }
      match service
        .storage
        .save(T::entity_type(), &key_hash, &description, &record)
      {
        Ok(()) => debug!(key = %description, "cached response"),
        Err(e) => warn!(key = %description, error = %e, "failed to cache response"),
      }
    });
  }
}

impl<N: NetworkSession, S: ResponseStorage> Clone for DataTransferService<N, S> {
  fn clone(&self) -> Self {
    Self {
      network: self.network.clone(),
      storage: Arc::clone(&self.storage),
      max_fallback_age: self.max_fallback_age,
      generation: Arc::clone(&self.generation),
    }
  }
}
