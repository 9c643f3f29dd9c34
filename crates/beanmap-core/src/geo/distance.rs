use super::Coordinates;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_km(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Round to one decimal place, the precision shown next to each shop.
pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let p = Coordinates::new(40.0, -73.0);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(1.0, 0.0);
        let d = haversine_km(&a, &b);
        assert!((d - 111.19).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinates::new(40.7128, -74.0060);
        let b = Coordinates::new(40.7306, -73.9352);
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(0.8006), 0.8);
        assert_eq!(round_to_tenth(2.1016), 2.1);
        assert_eq!(round_to_tenth(1.25), 1.3);
    }

    #[test]
    fn test_distance_km_rounds() {
        let user = Coordinates::new(40.0, -73.0);
        let shop = Coordinates::new(40.0072, -73.0);
        assert_eq!(user.distance_km(&shop), 0.8);
    }
}
