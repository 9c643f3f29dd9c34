//! Cache-first serving of the application shell and static assets.
//!
//! The lifecycle has three steps, each a function of the current
//! `CacheState` that hands back the next one:
//!
//! - `OfflineWorker::install` pre-populates the current generation from the
//!   asset manifest, tolerating individual failures
//! - `OfflineWorker::handle_fetch` answers same-origin requests from the
//!   cache, filling it from the network on a miss; cross-origin requests
//!   always go to the network and are never stored
//! - `OfflineWorker::activate` deletes every generation except the current
//!   one, the only eviction there is
//!
//! The network sits behind the `Fetcher` trait so the lifecycle can be
//! driven without a live connection.

pub mod error;
pub mod fetcher;
pub mod request;
pub mod state;
pub mod worker;

pub use error::OfflineError;
pub use fetcher::{Fetcher, HttpFetcher};
pub use request::{AssetRequest, AssetResponse, ResponseKind};
pub use state::{CacheState, Generation};
pub use worker::{InstallReport, OfflineWorker, Served, ServedFrom, WorkerConfig};
