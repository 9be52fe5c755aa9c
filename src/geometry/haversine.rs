/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two (lat, lon) points in degrees
///
/// Spherical Earth; no special handling near the poles or the antimeridian,
/// which is fine at metro scale.
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point_is_zero() {
        for p in [(36.18, -94.14), (0.0, 0.0), (-33.86, 151.21), (89.9, 179.9)] {
            assert_eq!(haversine_m(p, p), 0.0);
        }
    }

    #[test]
    fn test_haversine_symmetric() {
        let fayetteville = (36.0626, -94.1574);
        let bentonville = (36.3729, -94.2088);
        assert_eq!(
            haversine_m(fayetteville, bentonville),
            haversine_m(bentonville, fayetteville)
        );
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // One degree of arc on a 6371 km sphere is ~111.195 km
        let d = haversine_m((36.0, -94.0), (37.0, -94.0));
        assert!((d - 111_195.0).abs() < 5.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Fayetteville to Bentonville is roughly 35 km as the crow flies
        let d = haversine_m((36.0626, -94.1574), (36.3729, -94.2088));
        assert!(d > 33_000.0 && d < 36_000.0);
    }
}
