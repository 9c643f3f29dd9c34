//! beanmap core library.
//!
//! Everything the front ends need to find coffee shops and keep notes on them:
//!
//! - `geo`: coordinates, great-circle distance and the `Locator` seam
//! - `api`: Overpass client for nearby cafés
//! - `models`: shop, note and photo records
//! - `store`: per-shop local persistence of notes and photos
//! - `offline`: cache-first asset serving with generation-based updates
//! - `config`: on-disk configuration and directory layout

pub mod api;
pub mod config;
pub mod geo;
pub mod models;
pub mod offline;
pub mod store;
pub mod utils;

pub use api::{nearby_shops, NearbyShops, OverpassClient};
pub use config::Config;
pub use geo::{Coordinates, Locator};
pub use models::{Note, Photo, ShopRecord};
pub use store::{FileStore, KeyValueStore, MemoryStore, ShopStore, StoreError};
