//! Home feed section repository.

use crate::api::{ApiEndpoints, ApiQueryKey};
use crate::cache::{CachedResponse, ResponseStorage};
use crate::cancel::{Call, CancellationToken};
use crate::dto::SectionDto;
use crate::network::NetworkSession;
use crate::transfer::{DataTransferService, TransferResult};

use super::RepositoryCore;

pub struct SectionRepository<N: NetworkSession, S: ResponseStorage> {
  core: RepositoryCore<N, S>,
  endpoints: ApiEndpoints,
}

impl<N: NetworkSession, S: ResponseStorage> SectionRepository<N, S> {
  pub fn new(transfer: DataTransferService<N, S>, endpoints: ApiEndpoints) -> Self {
    Self {
      core: RepositoryCore::new(transfer),
      endpoints,
    }
  }

  pub fn get_sections(
    &self,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<TransferResult<SectionDto>>> {
    self
      .core
      .dispatch(parent, self.endpoints.sections(), ApiQueryKey::Sections)
  }

  pub fn cached_sections(&self) -> Option<CachedResponse<SectionDto>> {
    self.core.transfer.cached(&ApiQueryKey::Sections)
  }

  pub fn cancel(&self) {
    self.core.in_flight.cancel();
  }
}
