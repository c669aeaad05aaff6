//! Caching implementations for backend types.

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::cache::{Cacheable, QueryKey};
use crate::dto::{
  MediaDto, MediaListRequestDto, MediaRequestDto, ProfileDto, ProfilesRequestDto, SeasonDto,
  SeasonRequestDto, SectionDto,
};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for MediaDto {
  fn entity_type() -> &'static str {
    "media"
  }
}

impl Cacheable for SeasonDto {
  fn entity_type() -> &'static str {
    "season"
  }
}

impl Cacheable for SectionDto {
  fn entity_type() -> &'static str {
    "section"
  }
}

impl Cacheable for ProfileDto {
  fn entity_type() -> &'static str {
    "profile"
  }
}

// ============================================================================
// Query key types
// ============================================================================

/// Query key types for backend calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiQueryKey {
  /// Media catalogue, optionally filtered
  MediaList {
    media_type: Option<String>,
    genre: Option<String>,
  },
  /// Single media entry
  Media { id: String },
  /// One season of a series
  Season { media_id: String, season: u32 },
  /// Home feed sections
  Sections,
  /// Profiles of a user account
  Profiles { user_id: String },
}

impl From<&MediaListRequestDto> for ApiQueryKey {
  fn from(request: &MediaListRequestDto) -> Self {
    Self::MediaList {
      media_type: request.media_type.clone(),
      genre: request.genre.clone(),
    }
  }
}

impl From<&MediaRequestDto> for ApiQueryKey {
  fn from(request: &MediaRequestDto) -> Self {
    Self::Media {
      id: request.id.clone(),
    }
  }
}

impl From<&SeasonRequestDto> for ApiQueryKey {
  fn from(request: &SeasonRequestDto) -> Self {
    Self::Season {
      media_id: request.id.clone(),
      season: request.season,
    }
  }
}

impl From<&ProfilesRequestDto> for ApiQueryKey {
  fn from(request: &ProfilesRequestDto) -> Self {
    Self::Profiles {
      user_id: request.user_id.clone(),
    }
  }
}

impl QueryKey for ApiQueryKey {
  fn cache_hash(&self) -> String {
    // JSON keeps field boundaries and `None` vs `Some("")` apart
    let input = match self {
      Self::MediaList { media_type, genre } => json!(["media_list", media_type, genre]),
      Self::Media { id } => json!(["media", id]),
      Self::Season { media_id, season } => json!(["season", media_id, season]),
      Self::Sections => json!(["sections"]),
      Self::Profiles { user_id } => json!(["profiles", user_id]),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.to_string().as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }

  fn description(&self) -> String {
    match self {
      Self::MediaList {
        media_type: None,
        genre: None,
      } => "all".to_string(),
      Self::MediaList { media_type, genre } => format!(
        "media type={} genre={}",
        media_type.as_deref().unwrap_or("*"),
        genre.as_deref().unwrap_or("*")
      ),
      Self::Media { id } => format!("media {}", id),
      Self::Season { media_id, season } => format!("season {} of {}", season, media_id),
      Self::Sections => "all".to_string(),
      Self::Profiles { user_id } => format!("profiles of {}", user_id),
    }
  }
}
