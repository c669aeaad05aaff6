//! Season repository.

use crate::api::{ApiEndpoints, ApiQueryKey};
use crate::cache::{CachedResponse, ResponseStorage};
use crate::cancel::{Call, CancellationToken};
use crate::dto::{SeasonDto, SeasonRequestDto};
use crate::network::NetworkSession;
use crate::transfer::{DataTransferService, TransferResult};

use super::RepositoryCore;

pub struct SeasonRepository<N: NetworkSession, S: ResponseStorage> {
  core: RepositoryCore<N, S>,
  endpoints: ApiEndpoints,
}

impl<N: NetworkSession, S: ResponseStorage> SeasonRepository<N, S> {
  pub fn new(transfer: DataTransferService<N, S>, endpoints: ApiEndpoints) -> Self {
    Self {
      core: RepositoryCore::new(transfer),
      endpoints,
    }
  }

  /// Fetch one season of a series, keyed by `(media id, season number)`.
  pub fn get_season(
    &self,
    request: SeasonRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<TransferResult<SeasonDto>>> {
    let endpoint = self.endpoints.season(&request);
    self
      .core
      .dispatch(parent, endpoint, ApiQueryKey::from(&request))
  }

  pub fn cached_season(&self, request: &SeasonRequestDto) -> Option<CachedResponse<SeasonDto>> {
    self.core.transfer.cached(&ApiQueryKey::from(request))
  }

  /// Cancel the outstanding call, if any.
  pub fn cancel(&self) {
    self.core.in_flight.cancel();
  }
}
