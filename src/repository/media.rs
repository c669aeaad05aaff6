//! Media catalogue repository.

use crate::api::{ApiEndpoints, ApiQueryKey};
use crate::cache::{CachedResponse, ResponseStorage};
use crate::cancel::{Call, CancellationToken};
use crate::dto::{MediaDto, MediaListRequestDto, MediaRequestDto};
use crate::network::NetworkSession;
use crate::transfer::{DataTransferService, TransferResult};

use super::RepositoryCore;

pub struct MediaRepository<N: NetworkSession, S: ResponseStorage> {
  core: RepositoryCore<N, S>,
  endpoints: ApiEndpoints,
}

impl<N: NetworkSession, S: ResponseStorage> MediaRepository<N, S> {
  pub fn new(transfer: DataTransferService<N, S>, endpoints: ApiEndpoints) -> Self {
    Self {
      core: RepositoryCore::new(transfer),
      endpoints,
    }
  }

  /// Fetch the catalogue. Unfiltered requests are cached under `all`.
  pub fn get_media_list(
    &self,
    request: MediaListRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<TransferResult<MediaDto>>> {
    let endpoint = self.endpoints.media_list(&request);
    self
      .core
      .dispatch(parent, endpoint, ApiQueryKey::from(&request))
  }

  pub fn get_media(
    &self,
    request: MediaRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<TransferResult<MediaDto>>> {
    let endpoint = self.endpoints.media(&request);
    self
      .core
      .dispatch(parent, endpoint, ApiQueryKey::from(&request))
  }

  pub fn cached_media_list(&self, request: &MediaListRequestDto) -> Option<CachedResponse<MediaDto>> {
    self.core.transfer.cached(&ApiQueryKey::from(request))
  }

  pub fn cached_media(&self, request: &MediaRequestDto) -> Option<CachedResponse<MediaDto>> {
    self.core.transfer.cached(&ApiQueryKey::from(request))
  }

  pub fn cancel(&self) {
    self.core.in_flight.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use crate::error::{NetworkError, TransferError};
  use crate::network::NetworkClient;
  use crate::test_support::{StubResponse, StubSession};
  use std::sync::Arc;

  const CATALOGUE: &str = r#"{"status":"success","results":2,"data":[
    {"_id":"m1","title":"Dark","type":"series"},
    {"_id":"m2","title":"Heat","type":"film","year":1995}
  ]}"#;

  fn repository(session: &Arc<StubSession>) -> MediaRepository<Arc<StubSession>, MemoryStorage> {
    let transfer = DataTransferService::new(
      NetworkClient::new(Arc::clone(session), None),
      Arc::new(MemoryStorage::new()),
    );
    MediaRepository::new(transfer, ApiEndpoints::new("https://api.example.com/api/v1"))
  }

  #[tokio::test]
  async fn test_get_media_list() {
    let session = Arc::new(StubSession::new());
    session.respond("/media", StubResponse::ok(CATALOGUE));
    let repo = repository(&session);

    let delivered = repo
      .get_media_list(MediaListRequestDto::default(), None)
      .unwrap()
      .outcome()
      .await
      .unwrap()
      .unwrap();
    assert_eq!(delivered.data.results, 2);
    assert_eq!(delivered.data.data[1].year, Some(1995));
  }

  #[tokio::test]
  async fn test_get_media_not_found() {
    let session = Arc::new(StubSession::new());
    let repo = repository(&session);

    let result = repo
      .get_media(MediaRequestDto { id: "nope".into() }, None)
      .unwrap()
      .outcome()
      .await
      .unwrap();
    assert_eq!(
      result.unwrap_err(),
      TransferError::Network(NetworkError::ServerError(404))
    );
    assert!(repo
      .cached_media(&MediaRequestDto { id: "nope".into() })
      .is_none());
  }
}
