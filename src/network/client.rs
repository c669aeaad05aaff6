//! Network client: transport abstraction plus request dispatch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use tracing::debug;

use crate::cancel::Call;
use crate::config::ApiConfig;
use crate::error::NetworkError;

use super::endpoint::{Endpoint, HttpMethod, ResolvedRequest};

/// Raw answer from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Transport seam. Implementations perform exactly one attempt per call;
/// retry policy belongs to callers.
#[async_trait]
pub trait NetworkSession: Send + Sync + 'static {
  async fn execute(&self, request: ResolvedRequest) -> Result<RawResponse, NetworkError>;
}

#[async_trait]
impl<T: NetworkSession> NetworkSession for Arc<T> {
  async fn execute(&self, request: ResolvedRequest) -> Result<RawResponse, NetworkError> {
    (**self).execute(request).await
  }
}

/// reqwest-backed transport.
pub struct ReqwestSession {
  client: reqwest::Client,
}

impl ReqwestSession {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(config.user_agent.as_str())
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }

  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client }
  }

  fn convert_method(method: HttpMethod) -> reqwest::Method {
    match method {
      HttpMethod::Get => reqwest::Method::GET,
      HttpMethod::Post => reqwest::Method::POST,
      HttpMethod::Put => reqwest::Method::PUT,
      HttpMethod::Patch => reqwest::Method::PATCH,
      HttpMethod::Delete => reqwest::Method::DELETE,
    }
  }
}

#[async_trait]
impl NetworkSession for ReqwestSession {
  async fn execute(&self, request: ResolvedRequest) -> Result<RawResponse, NetworkError> {
    let mut builder = self
      .client
      .request(Self::convert_method(request.method), request.url)
      .header("Accept", "application/json");

    for (name, value) in request.headers {
      builder = builder.header(name, value);
    }
    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?.to_vec();

    Ok(RawResponse { status, body })
  }
}

/// Issues requests described by [`Endpoint`]s and decodes the answers.
pub struct NetworkClient<S: NetworkSession> {
  session: Arc<S>,
  auth_token: Option<String>,
}

impl<S: NetworkSession> NetworkClient<S> {
  pub fn new(session: S, auth_token: Option<String>) -> Self {
    Self {
      session: Arc::new(session),
      auth_token,
    }
  }

  /// Perform the request and check the status code.
  pub async fn fetch_raw<R>(&self, endpoint: &Endpoint<R>) -> Result<RawResponse, NetworkError> {
    let request = endpoint.resolve(self.auth_token.as_deref())?;
    debug!(method = %request.method, url = %request.url, "dispatching request");

    let raw = self.session.execute(request).await?;
    if !raw.is_success() {
      debug!(status = raw.status, path = endpoint.path(), "server error");
      return Err(NetworkError::ServerError(raw.status));
    }
    Ok(raw)
  }

  /// Perform the request and decode the payload with the endpoint's decoder.
  pub async fn fetch<R>(&self, endpoint: &Endpoint<R>) -> Result<R, NetworkError> {
    let raw = self.fetch_raw(endpoint).await?;
    endpoint.decode(&raw.body)
  }

  /// Dispatch in the background. Cancelling the returned call aborts the
  /// transport task and suppresses the completion.
  pub fn send<R>(&self, endpoint: Endpoint<R>) -> Call<Result<R, NetworkError>>
  where
    R: Send + 'static,
  {
    let client = self.clone();
    Call::spawn(async move { client.fetch(&endpoint).await })
  }

  /// Like [`send`](Self::send) but delivers the undecoded payload.
  pub fn send_raw<R>(&self, endpoint: Endpoint<R>) -> Call<Result<RawResponse, NetworkError>>
  where
    R: 'static,
  {
    let client = self.clone();
    Call::spawn(async move { client.fetch_raw(&endpoint).await })
  }
}

impl<S: NetworkSession> Clone for NetworkClient<S> {
  fn clone(&self) -> Self {
    Self {
      session: Arc::clone(&self.session),
      auth_token: self.auth_token.clone(),
    }
  }
}
