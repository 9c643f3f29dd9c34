//! Screen-specific content rendering.

pub mod landing;
pub mod map;
