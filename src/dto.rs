//! Wire-shaped request and response types.
//!
//! These mirror the backend JSON exactly and are kept apart from the
//! [`domain`](crate::domain) types so wire changes stay local to this module
//! and the `ToDomain` mappings below.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{AuthSession, Episode, Media, MediaKind, Profile, Season, Section, User};

/// Translation from a wire type into the shape the application consumes.
pub trait ToDomain {
  type Domain;

  fn to_domain(&self) -> Self::Domain;
}

// ============================================================================
// Response envelope
// ============================================================================

/// `{ status, results, data: [...] }`, shared by every backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
  pub status: String,
  #[serde(default)]
  pub results: u32,
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
}

impl<T> ResponseEnvelope<T> {
  pub fn new(status: impl Into<String>, data: Vec<T>) -> Self {
    Self {
      status: status.into(),
      results: data.len() as u32,
      data,
    }
  }

  /// Whether `results` agrees with the payload length. Callers must not
  /// rely on this holding.
  pub fn is_consistent(&self) -> bool {
    self.results as usize == self.data.len()
  }
}

impl<T: ToDomain> ToDomain for ResponseEnvelope<T> {
  type Domain = Vec<T::Domain>;

  fn to_domain(&self) -> Self::Domain {
    self.data.iter().map(ToDomain::to_domain).collect()
  }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Filters for the media catalogue. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaListRequestDto {
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub media_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub genre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRequestDto {
  pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonRequestDto {
  pub id: String,
  pub season: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilesRequestDto {
  pub user_id: String,
}

/// Credentials for the sign-in call. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignInRequestDto {
  pub email: String,
  pub password: String,
}

impl fmt::Debug for SignInRequestDto {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SignInRequestDto")
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .finish()
  }
}

// ============================================================================
// Entity DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDto {
  #[serde(rename = "_id")]
  pub id: String,
  pub title: String,
  #[serde(rename = "type")]
  pub media_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overview: Option<String>,
  #[serde(default)]
  pub genres: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub year: Option<u16>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub length: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub logo: Option<String>,
}

impl ToDomain for MediaDto {
  type Domain = Media;

  fn to_domain(&self) -> Media {
    Media {
      id: self.id.clone(),
      title: self.title.clone(),
      kind: MediaKind::from_wire(&self.media_type),
      overview: self.overview.clone().unwrap_or_default(),
      genres: self.genres.clone(),
      year: self.year,
      length: self.length.clone(),
      rating: self.rating,
      cover_path: self.cover.clone(),
      logo_path: self.logo.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDto {
  #[serde(rename = "_id")]
  pub id: String,
  pub episode: u32,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Runtime in minutes
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

impl ToDomain for EpisodeDto {
  type Domain = Episode;

  fn to_domain(&self) -> Episode {
    Episode {
      id: self.id.clone(),
      number: self.episode,
      title: self.title.clone(),
      description: self.description.clone().unwrap_or_default(),
      duration_minutes: self.duration,
      stream_url: self.url.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDto {
  #[serde(rename = "_id")]
  pub id: String,
  pub media: String,
  pub season: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default)]
  pub episodes: Vec<EpisodeDto>,
}

impl ToDomain for SeasonDto {
  type Domain = Season;

  fn to_domain(&self) -> Season {
    let mut episodes: Vec<Episode> = self.episodes.iter().map(ToDomain::to_domain).collect();
    episodes.sort_by_key(|e| e.number);

    Season {
      id: self.id.clone(),
      media_id: self.media.clone(),
      number: self.season,
      title: self.title.clone(),
      episodes,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDto {
  #[serde(rename = "_id")]
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub media: Vec<String>,
}

impl ToDomain for SectionDto {
  type Domain = Section;

  fn to_domain(&self) -> Section {
    Section {
      id: self.id.clone(),
      title: self.title.clone(),
      media_ids: self.media.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDto {
  #[serde(rename = "_id")]
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(default)]
  pub active: bool,
}

impl ToDomain for ProfileDto {
  type Domain = Profile;

  fn to_domain(&self) -> Profile {
    Profile {
      id: self.id.clone(),
      name: self.name.clone(),
      image_path: self.image.clone(),
      active: self.active,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
  #[serde(rename = "_id")]
  pub id: String,
  pub name: String,
  pub email: String,
}

impl ToDomain for UserDto {
  type Domain = User;

  fn to_domain(&self) -> User {
    User {
      id: self.id.clone(),
      name: self.name.clone(),
      email: self.email.clone(),
    }
  }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDto {
  pub token: String,
  pub user: UserDto,
}

impl fmt::Debug for SessionDto {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SessionDto")
      .field("token", &"<redacted>")
      .field("user", &self.user)
      .finish()
  }
}

impl ToDomain for SessionDto {
  type Domain = AuthSession;

  fn to_domain(&self) -> AuthSession {
    AuthSession {
      token: self.token.clone(),
      user: self.user.to_domain(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SEASON_JSON: &str = r#"{
    "status": "success",
    "results": 1,
    "data": [{
      "_id": "s1",
      "media": "X",
      "season": 1,
      "episodes": [
        { "_id": "e2", "episode": 2, "title": "Second", "duration": 48 },
        { "_id": "e1", "episode": 1, "title": "Pilot" }
      ]
    }]
  }"#;

  #[test]
  fn test_decode_season_envelope() {
    let envelope: ResponseEnvelope<SeasonDto> = serde_json::from_str(SEASON_JSON).unwrap();
    assert_eq!(envelope.status, "success");
    assert!(envelope.is_consistent());

    let seasons = envelope.to_domain();
    assert_eq!(seasons.len(), 1);
    let season = &seasons[0];
    assert_eq!(season.media_id, "X");
    assert_eq!(season.number, 1);
    // Episodes are ordered by number
    assert_eq!(season.episodes[0].title, "Pilot");
    assert_eq!(season.episodes[1].duration_minutes, Some(48));
  }

  #[test]
  fn test_inconsistent_results_count_does_not_fail() {
    let json = r#"{ "status": "success", "results": 5, "data": [] }"#;
    let envelope: ResponseEnvelope<MediaDto> = serde_json::from_str(json).unwrap();
    assert!(!envelope.is_consistent());
    assert!(envelope.to_domain().is_empty());
  }

  #[test]
  fn test_missing_data_defaults_to_empty() {
    let envelope: ResponseEnvelope<SectionDto> =
      serde_json::from_str(r#"{ "status": "fail" }"#).unwrap();
    assert_eq!(envelope.results, 0);
    assert!(envelope.data.is_empty());
  }

  #[test]
  fn test_media_kind_mapping() {
    let dto: MediaDto = serde_json::from_str(
      r#"{ "_id": "m1", "title": "Dark", "type": "series", "genres": ["drama"] }"#,
    )
    .unwrap();
    let media = dto.to_domain();
    assert_eq!(media.kind, MediaKind::Series);
    assert_eq!(media.overview, "");
    assert_eq!(media.genres, vec!["drama".to_string()]);
  }

  #[test]
  fn test_list_request_omits_absent_fields() {
    let request = MediaListRequestDto {
      media_type: Some("film".into()),
      genre: None,
    };
    assert_eq!(
      serde_json::to_string(&request).unwrap(),
      r#"{"type":"film"}"#
    );
  }

  #[test]
  fn test_secrets_are_redacted_in_debug() {
    let request = SignInRequestDto {
      email: "a@b.c".into(),
      password: "hunter2".into(),
    };
    assert!(!format!("{:?}", request).contains("hunter2"));

    let session = SessionDto {
      token: "jwt".into(),
      user: UserDto {
        id: "u1".into(),
        name: "A".into(),
        email: "a@b.c".into(),
      },
    };
    assert!(!format!("{:?}", session).contains("jwt"));
  }
}
