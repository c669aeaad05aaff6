//! Repositories: one domain-facing facade per entity family.
//!
//! Each repository keeps a single outstanding call. Starting a new call
//! cancels the previous one first, so only the latest result is observable.

mod media;
mod season;
mod section;
mod user;

pub use media::MediaRepository;
pub use season::SeasonRepository;
pub use section::SectionRepository;
pub use user::UserRepository;

use std::sync::Mutex;

use tracing::debug;

use crate::cache::{Cacheable, QueryKey, ResponseStorage};
use crate::cancel::{Call, CancellationToken};
use crate::dto::ResponseEnvelope;
use crate::error::TransferError;
use crate::network::{Endpoint, NetworkSession};
use crate::transfer::{DataTransferService, TransferResult};

/// Last-call-wins slot for the outstanding call of one repository.
#[derive(Default)]
struct InFlight {
  token: Mutex<Option<CancellationToken>>,
}

impl InFlight {
  /// Cancel the outstanding call (if any) and start the next one while
  /// holding the slot.
  fn replace_with<T>(&self, start: impl FnOnce() -> Call<T>) -> Call<T> {
    let mut slot = self
      .token
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(previous) = slot.take() {
      if previous.cancel() {
        debug!("cancelled previous repository call");
      }
    }

    let call = start();
    *slot = Some(call.token().clone());
    call
  }

  fn cancel(&self) {
    let mut slot = self
      .token
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(token) = slot.take() {
      token.cancel();
    }
  }
}

/// Shared plumbing behind every repository.
struct RepositoryCore<N: NetworkSession, S: ResponseStorage> {
  transfer: DataTransferService<N, S>,
  in_flight: InFlight,
}

impl<N: NetworkSession, S: ResponseStorage> RepositoryCore<N, S> {
  fn new(transfer: DataTransferService<N, S>) -> Self {
    Self {
      transfer,
      in_flight: InFlight::default(),
    }
  }

  /// Returns `None` without dispatching if the caller's token is already
  /// cancelled.
  fn dispatch<T, K>(
    &self,
    parent: Option<&CancellationToken>,
    endpoint: Endpoint<ResponseEnvelope<T>>,
    key: K,
  ) -> Option<Call<TransferResult<T>>>
  where
    T: Cacheable,
    K: QueryKey + 'static,
  {
    if is_cancelled(parent) {
      debug!(key = %key.description(), "caller cancelled before dispatch");
      return None;
    }
    Some(
      self
        .in_flight
        .replace_with(|| self.transfer.request_dto(endpoint, key)),
    )
  }

  fn dispatch_uncached<R>(
    &self,
    parent: Option<&CancellationToken>,
    endpoint: Endpoint<R>,
  ) -> Option<Call<Result<R, TransferError>>>
  where
    R: Send + 'static,
  {
    if is_cancelled(parent) {
      return None;
    }
    Some(
      self
        .in_flight
        .replace_with(|| self.transfer.request_uncached(endpoint)),
    )
  }
}

fn is_cancelled(token: Option<&CancellationToken>) -> bool {
  token.is_some_and(CancellationToken::is_cancelled)
}
