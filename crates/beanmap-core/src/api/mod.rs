//! Overpass API client for nearby cafés.
//!
//! `OverpassClient` issues a radius query for `amenity=cafe` nodes and
//! normalizes the answer into `ShopRecord`s sorted by distance.
//! `nearby_shops` wraps it for callers that want an empty list instead of
//! an error when the lookup fails.

pub mod client;
pub mod error;
pub mod query;

pub use client::{nearby_shops, NearbyShops, OverpassClient};
pub use error::ApiError;
pub use query::build_query;
