//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::network::{NetworkSession, RawResponse, ResolvedRequest};

/// One scripted answer.
#[derive(Debug, Clone)]
pub struct StubResponse {
  pub result: Result<RawResponse, NetworkError>,
  pub latency: Duration,
}

impl StubResponse {
  pub fn ok(body: &str) -> Self {
    Self::status(200, body)
  }

  pub fn status(status: u16, body: &str) -> Self {
    Self {
      result: Ok(RawResponse {
        status,
        body: body.as_bytes().to_vec(),
      }),
      latency: Duration::ZERO,
    }
  }

  pub fn error(error: NetworkError) -> Self {
    Self {
      result: Err(error),
      latency: Duration::ZERO,
    }
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }
}

/// Transport answering from per-path queues. The last queued response for
/// a path is sticky; unknown paths answer 404.
#[derive(Default)]
pub struct StubSession {
  routes: Mutex<Vec<(String, VecDeque<StubResponse>)>>,
  requests: Mutex<Vec<ResolvedRequest>>,
  offline: AtomicBool,
  calls: AtomicUsize,
}

impl StubSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, path: &str, response: StubResponse) {
    let mut routes = self.routes.lock().unwrap();
    match routes.iter_mut().find(|(p, _)| p == path) {
      Some((_, queue)) => queue.push_back(response),
      None => routes.push((path.to_string(), VecDeque::from([response]))),
    }
  }

  pub fn set_online(&self, online: bool) {
    self.offline.store(!online, Ordering::SeqCst);
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn requests(&self) -> Vec<ResolvedRequest> {
    self.requests.lock().unwrap().clone()
  }

  fn next_response(&self, path: &str) -> StubResponse {
    let mut routes = self.routes.lock().unwrap();
    let queue = routes
      .iter_mut()
      .find(|(p, _)| path.ends_with(p.as_str()))
      .map(|(_, q)| q);

    match queue {
      Some(q) if q.len() > 1 => q.pop_front().unwrap(),
      Some(q) if !q.is_empty() => q[0].clone(),
      _ => StubResponse::status(404, "not found"),
    }
  }
}

#[async_trait]
impl NetworkSession for StubSession {
  async fn execute(&self, request: ResolvedRequest) -> Result<RawResponse, NetworkError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let response = self.next_response(request.url.path());
    self.requests.lock().unwrap().push(request);

    if !response.latency.is_zero() {
      tokio::time::sleep(response.latency).await;
    }
    if self.offline.load(Ordering::SeqCst) {
      return Err(NetworkError::NoConnectivity);
    }
    response.result
  }
}
