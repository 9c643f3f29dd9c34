//! Data models for coffee shops and the user's attachments.
//!
//! - `ShopRecord`: a café normalized from an Overpass element
//! - `Note`, `Photo`: user content stored per shop
//! - `OverpassResponse`, `OverpassElement`: raw API response shapes

pub mod note;
pub mod photo;
pub mod shop;

pub use note::Note;
pub use photo::{mime_for_extension, Photo, PhotoError};
pub use shop::{OverpassElement, OverpassResponse, ShopRecord};
