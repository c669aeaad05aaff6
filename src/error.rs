//! Error taxonomy for the data layer.
//!
//! Only [`TransferError`] ever reaches application code. [`CacheError`] is
//! absorbed by the storage layer and turned into a cache miss, and
//! [`NetworkError`] is wrapped once the cache fallback has been tried.

use thiserror::Error;

/// Failures produced by the network client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
  /// The host could not be reached at all
  #[error("no network connectivity")]
  NoConnectivity,

  /// The request did not complete within the configured timeout
  #[error("request timed out")]
  Timeout,

  /// The server answered with a non-success status code
  #[error("server responded with status {0}")]
  ServerError(u16),

  /// The payload could not be parsed into the expected response shape
  #[error("failed to decode response: {0}")]
  DecodingFailed(String),

  /// The request was cancelled before it completed
  #[error("request was cancelled")]
  Cancelled,

  /// The endpoint could not be turned into a valid request
  #[error("invalid request: {0}")]
  InvalidRequest(String),
}

/// Failures inside the response cache. Never surfaced to callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
  #[error("no cached entity for key")]
  EntityNotFound,

  #[error("failed to deserialize cached entity: {0}")]
  DeserializationFailed(String),

  #[error("cache storage error: {0}")]
  Storage(String),
}

/// Failure delivered to a caller once both the network and the cache
/// failed to produce a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
  #[error("data transfer failed: {0}")]
  Network(#[from] NetworkError),
}

impl TransferError {
  /// The network failure behind this error.
  pub fn network_error(&self) -> &NetworkError {
    match self {
      TransferError::Network(e) => e,
    }
  }
}

impl From<reqwest::Error> for NetworkError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_timeout() {
      NetworkError::Timeout
    } else if e.is_connect() {
      NetworkError::NoConnectivity
    } else if let Some(status) = e.status() {
      NetworkError::ServerError(status.as_u16())
    } else if e.is_decode() || e.is_body() {
      NetworkError::DecodingFailed(e.to_string())
    } else if e.is_builder() {
      NetworkError::InvalidRequest(e.to_string())
    } else {
      NetworkError::NoConnectivity
    }
  }
}
