//! HTTP plumbing: endpoint descriptions and the network client.

mod client;
mod endpoint;

pub use client::{NetworkClient, NetworkSession, RawResponse, ReqwestSession};
pub use endpoint::{
  Endpoint, HttpMethod, JsonDecoder, RequestBody, ResolvedRequest, ResponseDecoder,
};
