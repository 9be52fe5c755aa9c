use crate::api::OverpassResponse;
use crate::api::overpass::Element;
use crate::domain::PointOfInterest;
use crate::geometry::ring_centroid;
use crate::network::{HighwayGraph, HighwayGraphBuilder};

/// Representative (lat, lon) of a feature
///
/// Nodes use their own position, ways the centroid of their geometry and
/// relations the center of their bounds.
fn feature_location(element: &Element) -> Option<(f64, f64)> {
    match element.type_.as_str() {
        "node" => Some((element.lat?, element.lon?)),
        "way" => {
            let points: Vec<(f64, f64)> = element
                .geometry
                .as_ref()?
                .iter()
                .map(|p| (p.lat, p.lon))
                .collect();
            ring_centroid(&points)
        }
        "relation" => {
            let b = element.bounds?;
            Some(((b.minlat + b.maxlat) / 2.0, (b.minlon + b.maxlon) / 2.0))
        }
        _ => None,
    }
}

/// Parse an amenity response into points of interest labeled with `city`
///
/// Elements without tags are geometry-only helpers and are skipped, as are
/// features whose location cannot be resolved.
pub fn parse_points_of_interest(response: &OverpassResponse, city: &str) -> Vec<PointOfInterest> {
    let mut pois = Vec::new();

    for element in &response.elements {
        let tags = match &element.tags {
            Some(t) => t,
            None => continue,
        };

        let (lat, lon) = match feature_location(element) {
            Some(loc) => loc,
            None => {
                log::debug!("Skipping {} {} without a location", element.type_, element.id);
                continue;
            }
        };

        let name = tags.get("name").cloned();
        pois.push(PointOfInterest::new(name, lat, lon, city));
    }

    pois
}

/// Build the highway graph from a `way ...; out body; >; out skel qt;` response
pub fn parse_highway_graph(response: &OverpassResponse, simplify: bool) -> HighwayGraph {
    let mut builder = HighwayGraphBuilder::new().simplify(simplify);

    for element in &response.elements {
        match element.type_.as_str() {
            "node" => {
                if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                    builder.add_node(element.id, lat, lon);
                }
            }
            "way" => {
                if let Some(nodes) = &element.nodes {
                    builder.add_way(nodes.clone());
                }
            }
            _ => {}
        }
    }

    builder.build()
}
