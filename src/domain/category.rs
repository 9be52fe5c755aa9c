/// Upper bound (exclusive) for a commuter hub, in meters from a highway node
pub const COMMUTER_HUB_MAX_M: f64 = 600.0;
/// Upper bound (exclusive) for a neighborhood cafe
pub const NEIGHBORHOOD_MAX_M: f64 = 2000.0;

/// Site classification derived from distance to the nearest highway node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteCategory {
    CommuterHub,
    NeighborhoodCafe,
    DestinationStudy,
}

impl SiteCategory {
    /// Classify a distance in meters. Boundaries fall into the farther category.
    pub fn classify(distance_m: f64) -> SiteCategory {
        if distance_m < COMMUTER_HUB_MAX_M {
            SiteCategory::CommuterHub
        } else if distance_m < NEIGHBORHOOD_MAX_M {
            SiteCategory::NeighborhoodCafe
        } else {
            SiteCategory::DestinationStudy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SiteCategory::CommuterHub => "Commuter Hub",
            SiteCategory::NeighborhoodCafe => "Neighborhood Cafe",
            SiteCategory::DestinationStudy => "Destination/Study",
        }
    }

    /// Marker color name understood by Leaflet.awesome-markers
    pub fn color(&self) -> &'static str {
        match self {
            SiteCategory::CommuterHub => "red",
            SiteCategory::NeighborhoodCafe => "orange",
            SiteCategory::DestinationStudy => "blue",
        }
    }

    /// Font Awesome icon name (without the `fa-` prefix)
    pub fn icon(&self) -> &'static str {
        match self {
            SiteCategory::CommuterHub => "car",
            SiteCategory::NeighborhoodCafe => "home",
            SiteCategory::DestinationStudy => "book",
        }
    }
}
