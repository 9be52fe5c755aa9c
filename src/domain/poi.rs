use super::SiteCategory;

/// A cafe (or other amenity) location collected from OpenStreetMap
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    /// `name` tag, absent for untagged features
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Short city label, e.g. "Rogers" for "Rogers, Arkansas, USA"
    pub city: String,
    /// Distance to the nearest highway node in meters, set by the flow stage
    pub dist_to_highway_m: Option<f64>,
}

impl PointOfInterest {
    pub fn new(name: Option<String>, lat: f64, lon: f64, city: impl Into<String>) -> Self {
        Self {
            name,
            lat,
            lon,
            city: city.into(),
            dist_to_highway_m: None,
        }
    }

    pub fn category(&self) -> Option<SiteCategory> {
        self.dist_to_highway_m.map(SiteCategory::classify)
    }
}

/// Derive the city label from a place query: text before the first comma
pub fn city_label(place: &str) -> &str {
    place.split(',').next().unwrap_or(place).trim()
}
