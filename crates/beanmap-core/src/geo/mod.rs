//! Geographic primitives and position lookup.
//!
//! - `Coordinates`: a latitude/longitude pair in degrees
//! - `distance`: haversine distance rounded for display
//! - `locator`: the `Locator` seam and its fixed and IP-based implementations

pub mod distance;
pub mod locator;

use serde::{Deserialize, Serialize};

pub use distance::{haversine_km, round_to_tenth};
pub use locator::{FixedLocator, IpLocator, LocationError, Locator};

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components fall inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Distance to `other` in kilometers, rounded to one decimal.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        round_to_tenth(haversine_km(self, other))
    }

    pub fn display(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Parse a `"lat,lon"` pair such as the `BEANMAP_LOCATION` variable.
pub fn parse_coordinates(input: &str) -> Result<Coordinates, LocationError> {
    let (lat, lon) = input
        .split_once(',')
        .ok_or_else(|| LocationError::Invalid(format!("expected \"lat,lon\", got {:?}", input)))?;

    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| LocationError::Invalid(format!("bad latitude: {:?}", lat.trim())))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| LocationError::Invalid(format!("bad longitude: {:?}", lon.trim())))?;

    let coords = Coordinates::new(lat, lon);
    if !coords.is_valid() {
        return Err(LocationError::Invalid(format!(
            "coordinates out of range: {}",
            coords.display()
        )));
    }
    Ok(coords)
}
