//! Service container: builds the transfer stack from configuration and
//! hands out repositories and use cases.

use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use tracing::info;

use crate::api::ApiEndpoints;
use crate::cache::{CachedRecord, MemoryStorage, NoopStorage, ResponseStorage, SqliteStorage};
use crate::config::{CacheConfig, Config};
use crate::error::CacheError;
use crate::network::{NetworkClient, NetworkSession, ReqwestSession};
use crate::repository::{MediaRepository, SeasonRepository, SectionRepository, UserRepository};
use crate::transfer::DataTransferService;
use crate::use_case::{
  FetchMediaUseCase, FetchSeasonUseCase, FetchSectionsUseCase, ListMediaUseCase,
  ListProfilesUseCase, SignInUseCase,
};

/// Storage selected at runtime.
pub enum StorageBackend {
  Sqlite(SqliteStorage),
  Memory(MemoryStorage),
  Noop(NoopStorage),
}

impl StorageBackend {
  /// SQLite at the configured (or default) path, or no-op when disabled.
  pub fn from_config(config: &CacheConfig) -> Result<Self> {
    if !config.enabled {
      info!("response cache disabled");
      return Ok(StorageBackend::Noop(NoopStorage));
    }

    let path = match &config.path {
      Some(path) => path.clone(),
      None => SqliteStorage::default_path()?,
    };
    info!(path = %path.display(), "opening response cache");
    Ok(StorageBackend::Sqlite(SqliteStorage::open(&path)?))
  }

  fn inner(&self) -> &dyn ResponseStorage {
    match self {
      StorageBackend::Sqlite(s) => s,
      StorageBackend::Memory(s) => s,
      StorageBackend::Noop(s) => s,
    }
  }
}

impl ResponseStorage for StorageBackend {
  fn load(&self, kind: &str, key_hash: &str) -> Result<CachedRecord, CacheError> {
    self.inner().load(kind, key_hash)
  }

  fn save(
    &self,
    kind: &str,
    key_hash: &str,
    description: &str,
    record: &CachedRecord,
  ) -> Result<(), CacheError> {
    self.inner().save(kind, key_hash, description, record)
  }

  fn clear(&self) -> Result<(), CacheError> {
    self.inner().clear()
  }
}

/// Everything the application needs, built once and passed explicitly.
pub struct Services<N: NetworkSession = ReqwestSession> {
  config: Config,
  transfer: DataTransferService<N, StorageBackend>,
  media: Arc<MediaRepository<N, StorageBackend>>,
  seasons: Arc<SeasonRepository<N, StorageBackend>>,
  sections: Arc<SectionRepository<N, StorageBackend>>,
  users: Arc<UserRepository<N, StorageBackend>>,
}

impl Services<ReqwestSession> {
  /// Production wiring: reqwest transport, storage from config, token
  /// from the environment.
  pub fn new(config: Config) -> Result<Self> {
    let session = ReqwestSession::new(&config.api)?;
    let storage = StorageBackend::from_config(&config.cache)?;
    let token = Config::api_token();
    Self::with_session(config, session, storage, token)
  }
}

impl<N: NetworkSession> Services<N> {
  pub fn with_session(
    config: Config,
    session: N,
    storage: StorageBackend,
    auth_token: Option<String>,
  ) -> Result<Self> {
    let mut transfer = DataTransferService::new(NetworkClient::new(session, auth_token), Arc::new(storage));
    if let Some(max_age) = config.cache.max_fallback_age() {
      let max_age = chrono::Duration::from_std(max_age)
        .map_err(|e| eyre!("Invalid cache.max_fallback_age_secs: {}", e))?;
      transfer = transfer.with_max_fallback_age(max_age);
    }

    let endpoints = ApiEndpoints::new(config.api.base_url.as_str());

    Ok(Self {
      media: Arc::new(MediaRepository::new(transfer.clone(), endpoints.clone())),
      seasons: Arc::new(SeasonRepository::new(transfer.clone(), endpoints.clone())),
      sections: Arc::new(SectionRepository::new(transfer.clone(), endpoints.clone())),
      users: Arc::new(UserRepository::new(transfer.clone(), endpoints)),
      transfer,
      config,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn transfer(&self) -> &DataTransferService<N, StorageBackend> {
    &self.transfer
  }

  pub fn media_repository(&self) -> Arc<MediaRepository<N, StorageBackend>> {
    Arc::clone(&self.media)
  }

  pub fn season_repository(&self) -> Arc<SeasonRepository<N, StorageBackend>> {
    Arc::clone(&self.seasons)
  }

  pub fn section_repository(&self) -> Arc<SectionRepository<N, StorageBackend>> {
    Arc::clone(&self.sections)
  }

  pub fn user_repository(&self) -> Arc<UserRepository<N, StorageBackend>> {
    Arc::clone(&self.users)
  }

  pub fn list_media(&self) -> ListMediaUseCase<N, StorageBackend> {
    ListMediaUseCase::new(self.media_repository())
  }

  pub fn fetch_media(&self) -> FetchMediaUseCase<N, StorageBackend> {
    FetchMediaUseCase::new(self.media_repository())
  }

  pub fn fetch_season(&self) -> FetchSeasonUseCase<N, StorageBackend> {
    FetchSeasonUseCase::new(self.season_repository())
  }

  pub fn fetch_sections(&self) -> FetchSectionsUseCase<N, StorageBackend> {
    FetchSectionsUseCase::new(self.section_repository())
  }

  pub fn list_profiles(&self) -> ListProfilesUseCase<N, StorageBackend> {
    ListProfilesUseCase::new(self.user_repository())
  }

  pub fn sign_in(&self) -> SignInUseCase<N, StorageBackend> {
    SignInUseCase::new(self.user_repository())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::QueryKey;
  use crate::dto::{ResponseEnvelope, SectionDto};
  use crate::test_support::StubSession;
  use chrono::Utc;

  fn config(yaml_cache: &str) -> Config {
    Config::from_yaml_str(&format!(
      "api:\n  base_url: https://api.example.com/api/v1\n{}",
      yaml_cache
    ))
    .unwrap()
  }

  #[test]
  fn test_disabled_cache_selects_noop() {
    let backend = StorageBackend::from_config(&config("cache:\n  enabled: false\n").cache).unwrap();
    assert!(matches!(backend, StorageBackend::Noop(_)));
  }

  #[test]
  fn test_configured_path_opens_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheConfig {
      enabled: true,
      path: Some(dir.path().join("nested").join("cache.db")),
      max_fallback_age_secs: None,
    };
    let backend = StorageBackend::from_config(&cache).unwrap();
    assert!(matches!(backend, StorageBackend::Sqlite(_)));
    assert!(dir.path().join("nested").join("cache.db").exists());
  }

  #[test]
  fn test_backend_delegates_to_inner_storage() {
    let backend = StorageBackend::Memory(MemoryStorage::new());
    let envelope = ResponseEnvelope::new(
      "success",
      vec![SectionDto {
        id: "home".into(),
        title: "Trending".into(),
        media: vec![],
      }],
    );
    let key = "sections".to_string();
    backend.write(&key, &envelope, Utc::now()).unwrap();

    let cached = backend.read::<SectionDto, _>(&key).unwrap();
    assert_eq!(cached.envelope.data, envelope.data);
    assert_eq!(key.description(), "sections");

    backend.clear().unwrap();
    assert!(backend.read::<SectionDto, _>(&key).is_none());
  }

  #[tokio::test]
  async fn test_container_shares_repositories() {
    let services = Services::with_session(
      config("cache:\n  max_fallback_age_secs: 60\n"),
      StubSession::new(),
      StorageBackend::Memory(MemoryStorage::new()),
      None,
    )
    .unwrap();

    assert!(Arc::ptr_eq(&services.season_repository(), &services.season_repository()));
    assert_eq!(services.config().cache.max_fallback_age_secs, Some(60));
  }
}
