//! Per-shop local persistence of notes and photos.
//!
//! Each shop owns two keys in a `KeyValueStore`, `shop_<id>_notes` and
//! `shop_<id>_photos`, each holding a JSON array. Every mutation reads the
//! whole array, changes it in memory and writes it back with a
//! compare-and-set, so a concurrent writer causes a retry instead of a
//! silently lost update. Notes and photos are independent units of
//! consistency.
//!
//! Stored data is permanent: nothing is evicted when a shop drops out of
//! range. `ShopStore::purge_shop` is the explicit way to remove it.

pub mod error;
pub mod ids;
pub mod kv;
pub mod shop_store;

pub use error::{Result, StoreError};
pub use ids::IdGenerator;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use shop_store::{notes_key, photos_key, ShopStore};
