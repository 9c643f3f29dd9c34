use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Note, Photo};
use crate::geo::Coordinates;

/// Top-level Overpass JSON response.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// A single point feature. Skeleton nodes come back without tags and
/// non-node elements without coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassElement {
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tags: Option<HashMap<String, String>>,
}

/// A café near the user, plus whatever the user has stored for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopRecord {
    pub id: i64,
    pub name: Option<String>,
    pub location: Coordinates,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
    pub cuisine: Option<String>,
    /// Distance from the user in kilometers, one decimal.
    pub distance_km: f64,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl ShopRecord {
    /// Normalize an Overpass element. Returns `None` for elements that are
    /// not usable as a shop (no coordinates or no tags).
    pub fn from_element(element: &OverpassElement, user: &Coordinates) -> Option<Self> {
        let (lat, lon) = (element.lat?, element.lon?);
        let tags = element.tags.as_ref()?;
        let location = Coordinates::new(lat, lon);

        Some(Self {
            id: element.id,
            name: tag(tags, &["name"]),
            location,
            address: format_address(tags),
            phone: tag(tags, &["contact:phone", "phone"]),
            website: tag(tags, &["website", "contact:website"]),
            opening_hours: tag(tags, &["opening_hours"]),
            cuisine: tag(tags, &["cuisine"]),
            distance_km: user.distance_km(&location),
            notes: Vec::new(),
            photos: Vec::new(),
        })
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed Coffee Shop")
    }

    pub fn display_address(&self) -> &str {
        self.address.as_deref().unwrap_or("Address not available")
    }

    pub fn display_phone(&self) -> &str {
        self.phone.as_deref().unwrap_or("Phone number not available")
    }

    pub fn display_website(&self) -> &str {
        self.website.as_deref().unwrap_or("Website not available")
    }

    pub fn display_opening_hours(&self) -> &str {
        self.opening_hours
            .as_deref()
            .unwrap_or("Opening hours not available")
    }

    pub fn display_cuisine(&self) -> &str {
        self.cuisine.as_deref().unwrap_or("coffee_shop")
    }

    pub fn display_distance(&self) -> String {
        format!("{:.1} km", self.distance_km)
    }

    /// Short summary of attachments, e.g. `Notes: 2 | Photos: 1`.
    pub fn attachment_summary(&self) -> String {
        format!("Notes: {} | Photos: {}", self.notes.len(), self.photos.len())
    }
}

/// First non-empty value among `keys`.
fn tag(tags: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| tags.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn format_address(tags: &HashMap<String, String>) -> Option<String> {
    let street = tag(tags, &["addr:street"])?;
    let line = match tag(tags, &["addr:housenumber"]) {
        Some(number) => format!("{} {}", number, street),
        None => street,
    };
    match tag(tags, &["addr:city"]) {
        Some(city) => Some(format!("{}, {}", line, city)),
        None => Some(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(json: &str) -> OverpassElement {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_element_full() {
        let e = element(
            r#"{"type":"node","id":12345,"lat":40.0072,"lon":-73.0,
                "tags":{"amenity":"cafe","name":"Bean There","addr:housenumber":"12",
                        "addr:street":"Main St","addr:city":"Springfield",
                        "contact:phone":"+1 555 0100","website":"https://bean.example",
                        "opening_hours":"Mo-Fr 07:00-17:00"}}"#,
        );
        let user = Coordinates::new(40.0, -73.0);
        let shop = ShopRecord::from_element(&e, &user).unwrap();

        assert_eq!(shop.id, 12345);
        assert_eq!(shop.display_name(), "Bean There");
        assert_eq!(shop.display_address(), "12 Main St, Springfield");
        assert_eq!(shop.display_phone(), "+1 555 0100");
        assert_eq!(shop.display_website(), "https://bean.example");
        assert_eq!(shop.display_opening_hours(), "Mo-Fr 07:00-17:00");
        assert_eq!(shop.distance_km, 0.8);
        assert_eq!(shop.display_distance(), "0.8 km");
    }

    #[test]
    fn test_from_element_placeholders() {
        let e = element(r#"{"id":1,"lat":40.0,"lon":-73.0,"tags":{"amenity":"cafe","name":"  "}}"#);
        let shop = ShopRecord::from_element(&e, &Coordinates::new(40.0, -73.0)).unwrap();

        assert_eq!(shop.display_name(), "Unnamed Coffee Shop");
        assert_eq!(shop.display_address(), "Address not available");
        assert_eq!(shop.display_phone(), "Phone number not available");
        assert_eq!(shop.display_website(), "Website not available");
        assert_eq!(shop.display_opening_hours(), "Opening hours not available");
        assert_eq!(shop.display_cuisine(), "coffee_shop");
        assert_eq!(shop.attachment_summary(), "Notes: 0 | Photos: 0");
    }

    #[test]
    fn test_phone_falls_back_to_plain_tag() {
        let e = element(r#"{"id":1,"lat":0.0,"lon":0.0,"tags":{"phone":"123"}}"#);
        let shop = ShopRecord::from_element(&e, &Coordinates::new(0.0, 0.0)).unwrap();
        assert_eq!(shop.phone.as_deref(), Some("123"));
    }

    #[test]
    fn test_skips_unusable_elements() {
        let user = Coordinates::new(0.0, 0.0);
        let skeleton = element(r#"{"id":2,"lat":1.0,"lon":1.0}"#);
        let way = element(r#"{"id":3,"tags":{"amenity":"cafe"}}"#);
        assert!(ShopRecord::from_element(&skeleton, &user).is_none());
        assert!(ShopRecord::from_element(&way, &user).is_none());
    }
}
