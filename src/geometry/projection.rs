/// Equirectangular projection from WGS84 to local meters
///
/// - x = (lon - center_lon) * cos(center_lat) * 111320
/// - y = (lat - center_lat) * 111320
///
/// Good enough for nearest-neighbor ordering across a metro region; final
/// distances are always computed with haversine.
#[derive(Debug, Clone)]
pub struct Projector {
    center_lat: f64,
    center_lon: f64,
    cos_lat: f64,
}

impl Projector {
    /// Create a projector centered at (lat, lon)
    pub fn new(center: (f64, f64)) -> Self {
        let (lat, lon) = center;
        Self {
            center_lat: lat,
            center_lon: lon,
            cos_lat: lat.to_radians().cos(),
        }
    }

    /// Center a projector on the mean of a set of (lat, lon) points
    pub fn centered_on(points: &[(f64, f64)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (sum_lat, sum_lon) = points
            .iter()
            .fold((0.0, 0.0), |(a, b), &(lat, lon)| (a + lat, b + lon));
        Some(Self::new((sum_lat / n, sum_lon / n)))
    }

    /// Project a lat/lon point to local meters
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        const METERS_PER_DEGREE: f64 = 111320.0;

        let x = (lon - self.center_lon) * self.cos_lat * METERS_PER_DEGREE;
        let y = (lat - self.center_lat) * METERS_PER_DEGREE;

        (x, y)
    }
}
