//! Streaming backend API: route table, endpoint factories and cache keys.

mod cache;
mod routes;

pub use cache::ApiQueryKey;
pub use routes::{ApiEndpoints, Route};
