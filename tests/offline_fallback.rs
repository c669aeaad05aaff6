use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mediaflow::cache::SqliteStorage;
use mediaflow::dto::SeasonRequestDto;
use mediaflow::network::{NetworkSession, RawResponse, ResolvedRequest};
use mediaflow::{Config, NetworkError, Services, Source, StorageBackend, TransferError, UseCase};

const SEASON: &str = r#"{
  "status": "success",
  "results": 1,
  "data": [{
    "_id": "s1",
    "media": "X",
    "season": 1,
    "episodes": [
      {"_id": "e2", "episode": 2, "title": "Second"},
      {"_id": "e1", "episode": 1, "title": "Pilot"}
    ]
  }]
}"#;

/// Backend double with a connectivity switch.
#[derive(Default)]
struct FakeBackend {
  offline: AtomicBool,
  hits: AtomicUsize,
}

#[async_trait]
impl NetworkSession for FakeBackend {
  async fn execute(&self, request: ResolvedRequest) -> Result<RawResponse, NetworkError> {
    self.hits.fetch_add(1, Ordering::SeqCst);
    if self.offline.load(Ordering::SeqCst) {
      return Err(NetworkError::NoConnectivity);
    }
    if request.url.path().ends_with("/seasons") {
      Ok(RawResponse {
        status: 200,
        body: SEASON.as_bytes().to_vec(),
      })
    } else {
      Ok(RawResponse {
        status: 404,
        body: Vec::new(),
      })
    }
  }
}

fn config() -> Config {
  Config::from_yaml_str("api:\n  base_url: https://api.example.com/api/v1\n").unwrap()
}

fn services(backend: Arc<FakeBackend>, db: &std::path::Path) -> Services<Arc<FakeBackend>> {
  let storage = StorageBackend::Sqlite(SqliteStorage::open(db).unwrap());
  Services::with_session(config(), backend, storage, None).unwrap()
}

fn request() -> SeasonRequestDto {
  SeasonRequestDto {
    id: "X".into(),
    season: 1,
  }
}

#[tokio::test]
async fn season_survives_restart_while_offline() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("cache.db");

  // First run, online
  {
    let backend = Arc::new(FakeBackend::default());
    let services = services(Arc::clone(&backend), &db);
    let use_case = services.fetch_season();

    let delivered = use_case
      .execute(request(), None)
      .unwrap()
      .outcome()
      .await
      .unwrap()
      .unwrap();
    assert_eq!(delivered.source, Source::Network);
    let season = delivered.data.unwrap();
    assert_eq!(season.episodes[0].number, 1);
    assert_eq!(season.episodes[1].number, 2);

    for _ in 0..100 {
      if use_case.cached(&request()).is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(use_case.cached(&request()).is_some());
  }

  // Second run, offline
  let backend = Arc::new(FakeBackend::default());
  backend.offline.store(true, Ordering::SeqCst);
  let services = services(Arc::clone(&backend), &db);
  let use_case = services.fetch_season();

  let mut early = None;
  let call = use_case
    .execute_with_cached(request(), None, |season| early = season)
    .unwrap();
  assert_eq!(early.as_ref().map(|s| s.media_id.as_str()), Some("X"));

  let delivered = call.outcome().await.unwrap().unwrap();
  assert!(delivered.source.is_cache());
  assert_eq!(delivered.data, early);
  assert_eq!(backend.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn offline_without_cache_reports_no_connectivity() {
  let dir = tempfile::tempdir().unwrap();
  let backend = Arc::new(FakeBackend::default());
  backend.offline.store(true, Ordering::SeqCst);
  let services = services(backend, &dir.path().join("cache.db"));

  let result = services
    .fetch_season()
    .execute(request(), None)
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
async fn cancelled_parent_never_reaches_backend() {
  let dir = tempfile::tempdir().unwrap();
  let backend = Arc::new(FakeBackend::default());
  let services = services(Arc::clone(&backend), &dir.path().join("cache.db"));

  let parent = mediaflow::CancellationToken::new();
  parent.cancel();

  assert!(services.fetch_season().execute(request(), Some(&parent)).is_none());
  assert_eq!(backend.hits.load(Ordering::SeqCst), 0);
}
