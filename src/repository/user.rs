//! User account repository: profiles and sign-in.

use crate::api::{ApiEndpoints, ApiQueryKey};
use crate::cache::{CachedResponse, ResponseStorage};
use crate::cancel::{Call, CancellationToken};
use crate::dto::{ProfileDto, ProfilesRequestDto, ResponseEnvelope, SessionDto, SignInRequestDto};
use crate::error::{CacheError, TransferError};
use crate::network::NetworkSession;
use crate::transfer::{DataTransferService, TransferResult};

use super::RepositoryCore;

pub struct UserRepository<N: NetworkSession, S: ResponseStorage> {
  core: RepositoryCore<N, S>,
  endpoints: ApiEndpoints,
}

impl<N: NetworkSession, S: ResponseStorage> UserRepository<N, S> {
  pub fn new(transfer: DataTransferService<N, S>, endpoints: ApiEndpoints) -> Self {
    Self {
      core: RepositoryCore::new(transfer),
      endpoints,
    }
  }

  pub fn get_profiles(
    &self,
    request: ProfilesRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<TransferResult<ProfileDto>>> {
    let endpoint = self.endpoints.profiles(&request);
    self
      .core
      .dispatch(parent, endpoint, ApiQueryKey::from(&request))
  }

  pub fn cached_profiles(&self, request: &ProfilesRequestDto) -> Option<CachedResponse<ProfileDto>> {
    self.core.transfer.cached(&ApiQueryKey::from(request))
  }

  /// Sign in. Credentials never touch the cache.
  pub fn sign_in(
    &self,
    request: SignInRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<Result<ResponseEnvelope<SessionDto>, TransferError>>> {
    match self.endpoints.sign_in(&request) {
      Ok(endpoint) => self.core.dispatch_uncached(parent, endpoint),
      Err(e) => Some(Call::spawn(async move { Err(e.into()) })),
    }
  }

  /// Drop every cached response, e.g. when the account signs out.
  pub fn sign_out(&self) -> Result<(), CacheError> {
    self.cancel();
    self.core.transfer.clear_cache()
  }

  pub fn cancel(&self) {
    self.core.in_flight.cancel();
  }
}
