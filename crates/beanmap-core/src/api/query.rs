use crate::geo::Coordinates;

/// Server-side timeout hint sent with every query, in seconds.
pub const SERVER_TIMEOUT_SECS: u32 = 25;

/// Overpass QL for café nodes within `radius_m` meters of `center`.
pub fn build_query(center: &Coordinates, radius_m: f64) -> String {
    format!(
        "[out:json][timeout:{}];(node[\"amenity\"=\"cafe\"](around:{},{},{}););out body;",
        SERVER_TIMEOUT_SECS, radius_m, center.lat, center.lon
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query() {
        let q = build_query(&Coordinates::new(40.0, -73.5), 3000.0);
        assert_eq!(
            q,
            "[out:json][timeout:25];(node[\"amenity\"=\"cafe\"](around:3000,40,-73.5););out body;"
        );
    }
}
