//! Data transfer and response caching for a video streaming client.
//!
//! Requests flow `UseCase -> Repository -> DataTransferService -> NetworkClient`.
//! Successful responses are stored per query; when the network fails the
//! last stored response for the same query is delivered instead.
//!
//! ```ignore
//! use mediaflow::{config::Config, dto::SeasonRequestDto, services::Services, use_case::UseCase};
//!
//! let services = Services::new(Config::load(None)?)?;
//! let request = SeasonRequestDto { id: "X".into(), season: 1 };
//! if let Some(call) = services.fetch_season().execute(request, None) {
//!   if let Some(Ok(delivered)) = call.outcome().await {
//!     println!("{:?} from {:?}", delivered.data, delivered.source);
//!   }
//! }
//! ```

pub mod api;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod domain;
pub mod dto;
pub mod error;
pub mod logging;
pub mod network;
pub mod repository;
pub mod services;
pub mod transfer;
pub mod use_case;

#[cfg(test)]
mod test_support;

pub use cache::{Delivered, Source};
pub use cancel::{Call, CancellationToken};
pub use config::Config;
pub use error::{CacheError, NetworkError, TransferError};
pub use services::{Services, StorageBackend};
pub use use_case::UseCase;
