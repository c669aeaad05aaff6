//! Use cases: one type per application intent.
//!
//! A use case delegates to a repository and hands back domain models. It can
//! optionally report a cached value synchronously before the network-backed
//! completion arrives.

use std::sync::Arc;

use crate::cache::{Delivered, ResponseStorage};
use crate::cancel::{Call, CancellationToken};
use crate::domain::{AuthSession, Media, Profile, Season, Section};
use crate::dto::{
  MediaListRequestDto, MediaRequestDto, ProfilesRequestDto, SeasonRequestDto, SignInRequestDto,
  ToDomain,
};
use crate::error::TransferError;
use crate::network::NetworkSession;
use crate::repository::{MediaRepository, SeasonRepository, SectionRepository, UserRepository};

/// Completion of a use case.
pub type UseCaseResult<T> = Result<Delivered<T>, TransferError>;

pub trait UseCase {
  type Request;
  type Output: Send + 'static;

  /// Start the intent. `None` means the caller's token was already
  /// cancelled and nothing was dispatched.
  fn execute(
    &self,
    request: Self::Request,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<UseCaseResult<Self::Output>>>;

  /// Last stored value for the request, if any.
  fn cached(&self, request: &Self::Request) -> Option<Self::Output>;

  /// Fire `on_cached` with the stored value (if any), then start the intent.
  fn execute_with_cached<F>(
    &self,
    request: Self::Request,
    parent: Option<&CancellationToken>,
    on_cached: F,
  ) -> Option<Call<UseCaseResult<Self::Output>>>
  where
    F: FnOnce(Self::Output),
  {
    if let Some(cached) = self.cached(&request) {
      on_cached(cached);
    }
    self.execute(request, parent)
  }
}

// ============================================================================
// Catalogue
// ============================================================================

pub struct ListMediaUseCase<N: NetworkSession, S: ResponseStorage> {
  repository: Arc<MediaRepository<N, S>>,
}

impl<N: NetworkSession, S: ResponseStorage> ListMediaUseCase<N, S> {
  pub fn new(repository: Arc<MediaRepository<N, S>>) -> Self {
    Self { repository }
  }
}

impl<N: NetworkSession, S: ResponseStorage> UseCase for ListMediaUseCase<N, S> {
  type Request = MediaListRequestDto;
  type Output = Vec<Media>;

  fn execute(
    &self,
    request: MediaListRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<UseCaseResult<Vec<Media>>>> {
    let call = self.repository.get_media_list(request, parent)?;
    Some(call.map(|result| result.map(|d| d.map(|envelope| envelope.to_domain()))))
  }

  fn cached(&self, request: &MediaListRequestDto) -> Option<Vec<Media>> {
    self
      .repository
      .cached_media_list(request)
      .map(|cached| cached.envelope.to_domain())
  }
}

pub struct FetchMediaUseCase<N: NetworkSession, S: ResponseStorage> {
  repository: Arc<MediaRepository<N, S>>,
}

impl<N: NetworkSession, S: ResponseStorage> FetchMediaUseCase<N, S> {
  pub fn new(repository: Arc<MediaRepository<N, S>>) -> Self {
    Self { repository }
  }
}

impl<N: NetworkSession, S: ResponseStorage> UseCase for FetchMediaUseCase<N, S> {
  type Request = MediaRequestDto;
  type Output = Option<Media>;

  fn execute(
    &self,
    request: MediaRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<UseCaseResult<Option<Media>>>> {
    let call = self.repository.get_media(request, parent)?;
    Some(call.map(|result| result.map(|d| d.map(|envelope| first(envelope.to_domain())))))
  }

  fn cached(&self, request: &MediaRequestDto) -> Option<Option<Media>> {
    self
      .repository
      .cached_media(request)
      .map(|cached| first(cached.envelope.to_domain()))
  }
}

// ============================================================================
// Seasons
// ============================================================================

pub struct FetchSeasonUseCase<N: NetworkSession, S: ResponseStorage> {
  repository: Arc<SeasonRepository<N, S>>,
}

impl<N: NetworkSession, S: ResponseStorage> FetchSeasonUseCase<N, S> {
  pub fn new(repository: Arc<SeasonRepository<N, S>>) -> Self {
    Self { repository }
  }
}

impl<N: NetworkSession, S: ResponseStorage> UseCase for FetchSeasonUseCase<N, S> {
  type Request = SeasonRequestDto;
  type Output = Option<Season>;

  fn execute(
    &self,
    request: SeasonRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<UseCaseResult<Option<Season>>>> {
    let call = self.repository.get_season(request, parent)?;
    Some(call.map(|result| result.map(|d| d.map(|envelope| first(envelope.to_domain())))))
  }

  fn cached(&self, request: &SeasonRequestDto) -> Option<Option<Season>> {
    self
      .repository
      .cached_season(request)
      .map(|cached| first(cached.envelope.to_domain()))
  }
}

// ============================================================================
// Home feed
// ============================================================================

pub struct FetchSectionsUseCase<N: NetworkSession, S: ResponseStorage> {
  repository: Arc<SectionRepository<N, S>>,
}

impl<N: NetworkSession, S: ResponseStorage> FetchSectionsUseCase<N, S> {
  pub fn new(repository: Arc<SectionRepository<N, S>>) -> Self {
    Self { repository }
  }
}

impl<N: NetworkSession, S: ResponseStorage> UseCase for FetchSectionsUseCase<N, S> {
  type Request = ();
  type Output = Vec<Section>;

  fn execute(
    &self,
    _request: (),
    parent: Option<&CancellationToken>,
  ) -> Option<Call<UseCaseResult<Vec<Section>>>> {
    let call = self.repository.get_sections(parent)?;
    Some(call.map(|result| result.map(|d| d.map(|envelope| envelope.to_domain()))))
  }

  fn cached(&self, _request: &()) -> Option<Vec<Section>> {
    self
      .repository
      .cached_sections()
      .map(|cached| cached.envelope.to_domain())
  }
}

// ============================================================================
// Account
// ============================================================================

pub struct ListProfilesUseCase<N: NetworkSession, S: ResponseStorage> {
  repository: Arc<UserRepository<N, S>>,
}

impl<N: NetworkSession, S: ResponseStorage> ListProfilesUseCase<N, S> {
  pub fn new(repository: Arc<UserRepository<N, S>>) -> Self {
    Self { repository }
  }
}

impl<N: NetworkSession, S: ResponseStorage> UseCase for ListProfilesUseCase<N, S> {
  type Request = ProfilesRequestDto;
  type Output = Vec<Profile>;

  fn execute(
    &self,
    request: ProfilesRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<UseCaseResult<Vec<Profile>>>> {
    let call = self.repository.get_profiles(request, parent)?;
    Some(call.map(|result| result.map(|d| d.map(|envelope| envelope.to_domain()))))
  }

  fn cached(&self, request: &ProfilesRequestDto) -> Option<Vec<Profile>> {
    self
      .repository
      .cached_profiles(request)
      .map(|cached| cached.envelope.to_domain())
  }
}

pub struct SignInUseCase<N: NetworkSession, S: ResponseStorage> {
  repository: Arc<UserRepository<N, S>>,
}

impl<N: NetworkSession, S: ResponseStorage> SignInUseCase<N, S> {
  pub fn new(repository: Arc<UserRepository<N, S>>) -> Self {
    Self { repository }
  }
}

impl<N: NetworkSession, S: ResponseStorage> UseCase for SignInUseCase<N, S> {
  type Request = SignInRequestDto;
  type Output = Option<AuthSession>;

  fn execute(
    &self,
    request: SignInRequestDto,
    parent: Option<&CancellationToken>,
  ) -> Option<Call<UseCaseResult<Option<AuthSession>>>> {
    let call = self.repository.sign_in(request, parent)?;
    Some(call.map(|result| {
      result.map(|envelope| Delivered::from_network(first(envelope.to_domain())))
    }))
  }

  /// Sessions are never cached.
  fn cached(&self, _request: &SignInRequestDto) -> Option<Option<AuthSession>> {
    None
  }
}

fn first<T>(items: Vec<T>) -> Option<T> {
  items.into_iter().next()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ApiEndpoints;
  use crate::cache::{MemoryStorage, Source};
  use crate::error::NetworkError;
  use crate::network::NetworkClient;
  use crate::test_support::{StubResponse, StubSession};
  use crate::transfer::DataTransferService;
  use std::sync::Mutex;
  use std::time::Duration;

  const SEASON_JSON: &str = r#"{"status":"success","results":1,"data":[{"_id":"s1","media":"X","season":1,"episodes":[{"_id":"e1","episode":1,"title":"Pilot"}]}]}"#;
  const SECTIONS_JSON: &str = r#"{"status":"success","results":1,"data":[{"_id":"home","title":"Trending","media":["m1","m2"]}]}"#;

  fn transfer(session: &Arc<StubSession>) -> DataTransferService<Arc<StubSession>, MemoryStorage> {
    DataTransferService::new(
      NetworkClient::new(Arc::clone(session), None),
      Arc::new(MemoryStorage::new()),
    )
  }

  fn endpoints() -> ApiEndpoints {
    ApiEndpoints::new("https://api.example.com/api/v1")
  }

  fn season_request() -> SeasonRequestDto {
    SeasonRequestDto {
      id: "X".into(),
      season: 1,
    }
  }

  #[tokio::test]
  async fn test_offline_season_served_from_cache() {
    let session = Arc::new(StubSession::new());
    session.respond("/seasons", StubResponse::ok(SEASON_JSON));
    let use_case = FetchSeasonUseCase::new(Arc::new(SeasonRepository::new(
      transfer(&session),
      endpoints(),
    )));

    let online = use_case
      .execute(season_request(), None)
      .unwrap()
      .outcome()
      .await
      .unwrap()
      .unwrap();
    assert_eq!(online.source, Source::Network);
    let season = online.data.clone().unwrap();
    assert_eq!(season.episodes.len(), 1);

    // Wait for the background cache write
    for _ in 0..50 {
      if use_case.cached(&season_request()).is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }

    session.set_online(false);
    let offline = use_case
      .execute(season_request(), None)
      .unwrap()
      .outcome()
      .await
      .unwrap()
      .unwrap();
    assert!(offline.source.is_cache());
    assert_eq!(offline.data, online.data);
  }

  #[tokio::test]
  async fn test_cached_notification_fires_before_completion() {
    let session = Arc::new(StubSession::new());
    session.respond("/sections", StubResponse::ok(SECTIONS_JSON));
    let use_case = FetchSectionsUseCase::new(Arc::new(SectionRepository::new(
      transfer(&session),
      endpoints(),
    )));

    // Nothing cached yet
    let notified = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notified);
    let call = use_case
      .execute_with_cached((), None, move |sections| sink.lock().unwrap().push(sections))
      .unwrap();
    assert!(notified.lock().unwrap().is_empty());
    let sections = call.outcome().await.unwrap().unwrap().data;
    assert_eq!(sections[0].media_ids.len(), 2);

    for _ in 0..50 {
      if use_case.cached(&()).is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let sink = Arc::clone(&notified);
    let call = use_case
      .execute_with_cached((), None, move |sections| sink.lock().unwrap().push(sections))
      .unwrap();
    assert_eq!(notified.lock().unwrap().len(), 1);
    assert_eq!(notified.lock().unwrap()[0][0].title, "Trending");
    assert!(call.outcome().await.unwrap().is_ok());
  }

  #[tokio::test]
  async fn test_failure_without_cache_reaches_caller() {
    let session = Arc::new(StubSession::new());
    session.set_online(false);
    let use_case = ListMediaUseCase::new(Arc::new(MediaRepository::new(
      transfer(&session),
      endpoints(),
    )));

    let result = use_case
      .execute(MediaListRequestDto::default(), None)
      .unwrap()
      .outcome()
      .await
      .unwrap();
    assert_eq!(
      result.unwrap_err(),
      TransferError::Network(NetworkError::NoConnectivity)
    );
  }

  #[tokio::test]
  async fn test_cancelling_use_case_call() {
    let session = Arc::new(StubSession::new());
    session.respond(
      "/media/m1",
      StubResponse::ok(r#"{"status":"success","results":0,"data":[]}"#)
        .with_latency(Duration::from_millis(50)),
    );
    let use_case = FetchMediaUseCase::new(Arc::new(MediaRepository::new(
      transfer(&session),
      endpoints(),
    )));

    let call = use_case
      .execute(MediaRequestDto { id: "m1".into() }, None)
      .unwrap();
    call.cancel();
    assert!(call.outcome().await.is_none());
  }

  #[tokio::test]
  async fn test_sign_in_yields_session() {
    let session = Arc::new(StubSession::new());
    session.respond(
      "/users/signin",
      StubResponse::ok(
        r#"{"status":"success","results":1,"data":[{"token":"jwt","user":{"_id":"u1","name":"Ana","email":"ana@example.com"}}]}"#,
      ),
    );
    let use_case = SignInUseCase::new(Arc::new(UserRepository::new(
      transfer(&session),
      endpoints(),
    )));
    let request = SignInRequestDto {
      email: "ana@example.com".into(),
      password: "pw".into(),
    };

    assert!(use_case.cached(&request).is_none());
    let auth = use_case
      .execute(request, None)
      .unwrap()
      .outcome()
      .await
      .unwrap()
      .unwrap()
      .data
      .unwrap();
    assert_eq!(auth.user.id, "u1");
    assert_eq!(auth.token, "jwt");
  }
}
