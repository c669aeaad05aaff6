//! Route table and endpoint factories for the streaming backend.
//!
//! | Operation        | Method | Path template              | Query keys     |
//! |------------------|--------|----------------------------|----------------|
//! | `media.list`     | GET    | `media`                    | `type`, `genre`|
//! | `media.detail`   | GET    | `media/{id}`               |                |
//! | `season.detail`  | GET    | `seasons`                  | `id`, `season` |
//! | `section.list`   | GET    | `sections`                 |                |
//! | `user.profiles`  | GET    | `users/{user_id}/profiles` |                |
//! | `user.signin`    | POST   | `users/signin`             |                |

use crate::dto::{
  MediaDto, MediaListRequestDto, MediaRequestDto, ProfileDto, ProfilesRequestDto, ResponseEnvelope,
  SeasonDto, SeasonRequestDto, SectionDto, SessionDto, SignInRequestDto,
};
use crate::error::NetworkError;
use crate::network::{Endpoint, HttpMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  MediaList,
  MediaDetail,
  SeasonDetail,
  SectionList,
  UserProfiles,
  SignIn,
}

impl Route {
  pub const ALL: [Route; 6] = [
    Route::MediaList,
    Route::MediaDetail,
    Route::SeasonDetail,
    Route::SectionList,
    Route::UserProfiles,
    Route::SignIn,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Route::MediaList => "media.list",
      Route::MediaDetail => "media.detail",
      Route::SeasonDetail => "season.detail",
      Route::SectionList => "section.list",
      Route::UserProfiles => "user.profiles",
      Route::SignIn => "user.signin",
    }
  }

  pub fn method(&self) -> HttpMethod {
    match self {
      Route::SignIn => HttpMethod::Post,
      _ => HttpMethod::Get,
    }
  }

  pub fn path_template(&self) -> &'static str {
    match self {
      Route::MediaList => "media",
      Route::MediaDetail => "media/{id}",
      Route::SeasonDetail => "seasons",
      Route::SectionList => "sections",
      Route::UserProfiles => "users/{user_id}/profiles",
      Route::SignIn => "users/signin",
    }
  }

  pub fn query_keys(&self) -> &'static [&'static str] {
    match self {
      Route::MediaList => &["type", "genre"],
      Route::SeasonDetail => &["id", "season"],
      _ => &[],
    }
  }

  /// Fill `{name}` placeholders with values percent-encoded as single
  /// path segments.
  pub fn path(&self, params: &[(&str, &str)]) -> String {
    params
      .iter()
      .fold(self.path_template().to_string(), |path, (name, value)| {
        path.replace(&format!("{{{}}}", name), &urlencoding::encode(value))
      })
  }
}

/// Builds typed endpoints against one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
  base_url: String,
}

impl ApiEndpoints {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn endpoint<T: serde::de::DeserializeOwned + 'static>(
    &self,
    route: Route,
    params: &[(&str, &str)],
  ) -> Endpoint<ResponseEnvelope<T>> {
    Endpoint::new(self.base_url.as_str(), route.path(params), route.method())
  }

  pub fn media_list(&self, request: &MediaListRequestDto) -> Endpoint<ResponseEnvelope<MediaDto>> {
    self
      .endpoint(Route::MediaList, &[])
      .with_optional_query("type", request.media_type.as_deref())
      .with_optional_query("genre", request.genre.as_deref())
  }

  pub fn media(&self, request: &MediaRequestDto) -> Endpoint<ResponseEnvelope<MediaDto>> {
    self.endpoint(Route::MediaDetail, &[("id", &request.id)])
  }

  pub fn season(&self, request: &SeasonRequestDto) -> Endpoint<ResponseEnvelope<SeasonDto>> {
    self
      .endpoint(Route::SeasonDetail, &[])
      .with_query("id", &request.id)
      .with_query("season", request.season)
  }

  pub fn sections(&self) -> Endpoint<ResponseEnvelope<SectionDto>> {
    self.endpoint(Route::SectionList, &[])
  }

  pub fn profiles(&self, request: &ProfilesRequestDto) -> Endpoint<ResponseEnvelope<ProfileDto>> {
    self
      .endpoint(Route::UserProfiles, &[("user_id", &request.user_id)])
      .authenticated()
  }

  pub fn sign_in(
    &self,
    request: &SignInRequestDto,
  ) -> Result<Endpoint<ResponseEnvelope<SessionDto>>, NetworkError> {
    self.endpoint(Route::SignIn, &[]).with_json_body(request)
  }
}
