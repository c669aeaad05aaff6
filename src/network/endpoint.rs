//! Endpoint descriptions.
//!
//! An [`Endpoint`] is an immutable value describing one network operation:
//! where to send it, how to encode the body and how to decode the answer.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::NetworkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
  Get,
  Post,
  Put,
  Patch,
  Delete,
}

impl HttpMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
      HttpMethod::Put => "PUT",
      HttpMethod::Patch => "PATCH",
      HttpMethod::Delete => "DELETE",
    }
  }
}

impl fmt::Display for HttpMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Request body encoding rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
  Empty,
  /// Serialized as `application/json`
  Json(serde_json::Value),
  /// Serialized as `application/x-www-form-urlencoded`
  Form(Vec<(String, String)>),
}

/// Response decoding rule.
pub trait ResponseDecoder<R>: Send + Sync {
  fn decode(&self, body: &[u8]) -> Result<R, NetworkError>;
}

/// Decodes a JSON payload with serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl<R: DeserializeOwned> ResponseDecoder<R> for JsonDecoder {
  fn decode(&self, body: &[u8]) -> Result<R, NetworkError> {
    serde_json::from_slice(body).map_err(|e| NetworkError::DecodingFailed(e.to_string()))
  }
}

/// A request ready to go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
  pub method: HttpMethod,
  pub url: Url,
  pub headers: Vec<(String, String)>,
  pub body: Option<Vec<u8>>,
}

/// Full description of one network operation, typed by the response it
/// decodes into.
pub struct Endpoint<R> {
  base_url: String,
  path: String,
  method: HttpMethod,
  headers: Vec<(String, String)>,
  query: Vec<(String, String)>,
  body: RequestBody,
  requires_auth: bool,
  decoder: Arc<dyn ResponseDecoder<R>>,
  _response: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned + 'static> Endpoint<R> {
  /// Create an endpoint that decodes its response as JSON.
  pub fn new(base_url: impl Into<String>, path: impl Into<String>, method: HttpMethod) -> Self {
    Self {
      base_url: base_url.into(),
      path: path.into(),
      method,
      headers: Vec::new(),
      query: Vec::new(),
      body: RequestBody::Empty,
      requires_auth: false,
      decoder: Arc::new(JsonDecoder),
      _response: PhantomData,
    }
  }
}

impl<R> Endpoint<R> {
  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
    self.query.push((key.into(), value.to_string()));
    self
  }

  /// Add a query parameter only when a value is present.
  pub fn with_optional_query<V: ToString>(self, key: &str, value: Option<V>) -> Self {
    match value {
      Some(v) => self.with_query(key, v),
      None => self,
    }
  }

  pub fn with_json_body<B: Serialize>(mut self, body: &B) -> Result<Self, NetworkError> {
    let value =
      serde_json::to_value(body).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
    self.body = RequestBody::Json(value);
    Ok(self)
  }

  pub fn with_form_body(mut self, fields: Vec<(String, String)>) -> Self {
    self.body = RequestBody::Form(fields);
    self
  }

  pub fn with_decoder(mut self, decoder: impl ResponseDecoder<R> + 'static) -> Self {
    self.decoder = Arc::new(decoder);
    self
  }

  /// Mark the endpoint as needing the bearer token.
  pub fn authenticated(mut self) -> Self {
    self.requires_auth = true;
    self
  }

  pub fn method(&self) -> HttpMethod {
    self.method
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn query(&self) -> &[(String, String)] {
    &self.query
  }

  pub fn headers(&self) -> &[(String, String)] {
    &self.headers
  }

  pub fn body(&self) -> &RequestBody {
    &self.body
  }

  pub fn requires_auth(&self) -> bool {
    self.requires_auth
  }

  /// Build the full URL including query parameters.
  pub fn url(&self) -> Result<Url, NetworkError> {
    let raw = format!(
      "{}/{}",
      self.base_url.trim_end_matches('/'),
      self.path.trim_start_matches('/')
    );
    let mut url = Url::parse(&raw).map_err(|e| NetworkError::InvalidRequest(format!("{raw}: {e}")))?;

    if !self.query.is_empty() {
      url.query_pairs_mut().extend_pairs(self.query.iter());
    }
    Ok(url)
  }

  /// Resolve into a wire request. The bearer token is attached only when
  /// the endpoint requires authentication.
  pub fn resolve(&self, auth_token: Option<&str>) -> Result<ResolvedRequest, NetworkError> {
    let url = self.url()?;
    let mut headers = self.headers.clone();

    if self.requires_auth {
      let token = auth_token
        .ok_or_else(|| NetworkError::InvalidRequest("endpoint requires an API token".into()))?;
      headers.push(("Authorization".into(), format!("Bearer {token}")));
    }

    let body = match &self.body {
      RequestBody::Empty => None,
      RequestBody::Json(value) => {
        headers.push(("Content-Type".into(), "application/json".into()));
        Some(serde_json::to_vec(value).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?)
      }
      RequestBody::Form(fields) => {
        headers.push((
          "Content-Type".into(),
          "application/x-www-form-urlencoded".into(),
        ));
        let encoded = url::form_urlencoded::Serializer::new(String::new())
          .extend_pairs(fields.iter())
          .finish();
        Some(encoded.into_bytes())
      }
    };

    Ok(ResolvedRequest {
      method: self.method,
      url,
      headers,
      body,
    })
  }

  pub fn decode(&self, body: &[u8]) -> Result<R, NetworkError> {
    self.decoder.decode(body)
  }
}

impl<R> Clone for Endpoint<R> {
  fn clone(&self) -> Self {
    Self {
      base_url: self.base_url.clone(),
      path: self.path.clone(),
      method: self.method,
      headers: self.headers.clone(),
      query: self.query.clone(),
      body: self.body.clone(),
      requires_auth: self.requires_auth,
      decoder: Arc::clone(&self.decoder),
      _response: PhantomData,
    }
  }
}

impl<R> fmt::Debug for Endpoint<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Endpoint")
      .field("method", &self.method)
      .field("base_url", &self.base_url)
      .field("path", &self.path)
      .field("query", &self.query)
      .finish_non_exhaustive()
  }
}
