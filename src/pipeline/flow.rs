use anyhow::{Result, bail};

use crate::domain::PointOfInterest;
use crate::network::HighwayGraph;

/// Snap every point to its nearest highway node and record the distance
pub fn annotate_distances(pois: &mut [PointOfInterest], graph: &HighwayGraph) -> Result<()> {
    if graph.is_empty() {
        bail!("Highway graph has no nodes; cannot compute highway distances");
    }

    for poi in pois.iter_mut() {
        let Some(node) = graph.nearest_node(poi.lat, poi.lon) else {
            continue;
        };
        log::debug!(
            "{} -> node {} ({:.5}, {:.5}), {:.0} m",
            poi.name.as_deref().unwrap_or("Unnamed"),
            node.id,
            node.lat,
            node.lon,
            node.distance_m
        );
        poi.dist_to_highway_m = Some(node.distance_m);
    }

    Ok(())
}
