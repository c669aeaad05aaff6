//! Domain models handed to the application.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
  Series,
  Film,
  Other(String),
}

impl MediaKind {
  pub fn from_wire(value: &str) -> Self {
    match value.to_lowercase().as_str() {
      "series" | "tvshow" => MediaKind::Series,
      "film" | "movie" => MediaKind::Film,
      _ => MediaKind::Other(value.to_string()),
    }
  }
}

/// Catalogue entry (series or film).
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
  pub id: String,
  pub title: String,
  pub kind: MediaKind,
  pub overview: String,
  pub genres: Vec<String>,
  pub year: Option<u16>,
  pub length: Option<String>,
  pub rating: Option<f32>,
  pub cover_path: Option<String>,
  pub logo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
  pub id: String,
  pub number: u32,
  pub title: String,
  pub description: String,
  pub duration_minutes: Option<u32>,
  pub stream_url: Option<String>,
}

/// One season of a series, episodes ordered by number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
  pub id: String,
  pub media_id: String,
  pub number: u32,
  pub title: Option<String>,
  pub episodes: Vec<Episode>,
}

/// Home feed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
  pub id: String,
  pub title: String,
  pub media_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
  pub id: String,
  pub name: String,
  pub image_path: Option<String>,
  pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
}

/// Signed-in user plus the bearer token for authenticated calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
  pub token: String,
  pub user: User,
}

impl fmt::Debug for AuthSession {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AuthSession")
      .field("token", &"<redacted>")
      .field("user", &self.user)
      .finish()
  }
}
