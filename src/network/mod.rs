//! Highway graph with a spatial index for nearest-node snapping.
//!
//! Nodes are indexed in an R-tree (via `rstar`) after an equirectangular
//! projection to meters around the graph's mean position. The projection is
//! only used to rank candidates; reported distances are haversine.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::HashMap;

use crate::geometry::{Projector, haversine_m};

/// R-tree entry: projected `[x, y]` in meters plus the OSM node id
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: u64,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// A node the query point snapped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappedNode {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
    /// Haversine distance from the query point, meters
    pub distance_m: f64,
}

pub struct HighwayGraph {
    node_pos: HashMap<u64, (f64, f64)>,
    way_count: usize,
    projector: Option<Projector>,
    spatial_idx: RTree<NodeEntry>,
}

impl HighwayGraph {
    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn way_count(&self) -> usize {
        self.way_count
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    pub fn node_position(&self, id: u64) -> Option<(f64, f64)> {
        self.node_pos.get(&id).copied()
    }

    /// Nearest graph node to (lat, lon). `None` only for an empty graph.
    pub fn nearest_node(&self, lat: f64, lon: f64) -> Option<SnappedNode> {
        let projector = self.projector.as_ref()?;
        let (x, y) = projector.project(lat, lon);
        let entry = self.spatial_idx.nearest_neighbor(&[x, y])?;
        let (node_lat, node_lon) = self.node_position(entry.id)?;

        Some(SnappedNode {
            id: entry.id,
            lat: node_lat,
            lon: node_lon,
            distance_m: haversine_m((lat, lon), (node_lat, node_lon)),
        })
    }
}

/// Collect highway ways and node positions, then [`build`](Self::build) the graph.
#[derive(Default)]
pub struct HighwayGraphBuilder {
    node_pos: HashMap<u64, (f64, f64)>,
    ways: Vec<Vec<u64>>,
    simplify: bool,
}

impl HighwayGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only way endpoints and nodes shared between ways (or repeated in one)
    pub fn simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    pub fn add_node(&mut self, id: u64, lat: f64, lon: f64) {
        self.node_pos.insert(id, (lat, lon));
    }

    pub fn add_way(&mut self, node_refs: Vec<u64>) {
        if !node_refs.is_empty() {
            self.ways.push(node_refs);
        }
    }

    fn retained_nodes(&self) -> Vec<u64> {
        let mut refs: HashMap<u64, usize> = HashMap::new();
        for way in &self.ways {
            for id in way {
                *refs.entry(*id).or_default() += 1;
            }
        }

        let mut keep: Vec<u64> = if self.simplify {
            let mut keep: Vec<u64> = refs
                .iter()
                .filter(|&(_, &count)| count > 1)
                .map(|(&id, _)| id)
                .collect();
            for way in &self.ways {
                keep.extend(way.first());
                keep.extend(way.last());
            }
            keep
        } else {
            refs.into_keys().collect()
        };

        keep.sort_unstable();
        keep.dedup();
        // Ways can reference nodes the response did not include
        keep.retain(|id| self.node_pos.contains_key(id));
        keep
    }

    pub fn build(self) -> HighwayGraph {
        let kept = self.retained_nodes();
        let node_pos: HashMap<u64, (f64, f64)> = kept
            .iter()
            .map(|id| (*id, self.node_pos[id]))
            .collect();

        let positions: Vec<(f64, f64)> = kept.iter().map(|id| node_pos[id]).collect();
        let projector = Projector::centered_on(&positions);

        let entries: Vec<NodeEntry> = match &projector {
            Some(p) => kept
                .iter()
                .map(|&id| {
                    let (lat, lon) = node_pos[&id];
                    let (x, y) = p.project(lat, lon);
                    NodeEntry { point: [x, y], id }
                })
                .collect(),
            None => Vec::new(),
        };

        HighwayGraph {
            node_pos,
            way_count: self.ways.len(),
            projector,
            spatial_idx: RTree::bulk_load(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two ways forming a T: 1-2-3-4 and 5-6-3
    fn t_junction(simplify: bool) -> HighwayGraph {
        let mut b = HighwayGraphBuilder::new().simplify(simplify);
        b.add_node(1, 36.00, -94.10);
        b.add_node(2, 36.01, -94.10);
        b.add_node(3, 36.02, -94.10);
        b.add_node(4, 36.03, -94.10);
        b.add_node(5, 36.02, -94.12);
        b.add_node(6, 36.02, -94.11);
        b.add_way(vec![1, 2, 3, 4]);
        b.add_way(vec![5, 6, 3]);
        b.build()
    }

    #[test]
    fn test_empty_graph() {
        let graph = HighwayGraphBuilder::new().build();
        assert!(graph.is_empty());
        assert!(graph.nearest_node(36.0, -94.0).is_none());
    }

    #[test]
    fn test_simplify_keeps_endpoints_and_intersections() {
        let graph = t_junction(true);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.way_count(), 2);
        for id in [1, 3, 4, 5] {
            assert!(graph.node_position(id).is_some(), "node {id} missing");
        }
        assert!(graph.node_position(2).is_none());
        assert!(graph.node_position(6).is_none());
    }

    #[test]
    fn test_unsimplified_keeps_all_referenced() {
        let graph = t_junction(false);
        assert_eq!(graph.node_count(), 6);
    }

    #[test]
    fn test_nearest_node() {
        let graph = t_junction(false);
        let snapped = graph.nearest_node(36.0102, -94.1001).unwrap();
        assert_eq!(snapped.id, 2);
        assert!(snapped.distance_m < 30.0);

        let exact = graph.nearest_node(36.03, -94.10).unwrap();
        assert_eq!(exact.id, 4);
        assert_eq!(exact.distance_m, 0.0);
    }

    #[test]
    fn test_nearest_node_after_simplify_skips_interior() {
        let graph = t_junction(true);
        // Node 2 is gone, so the closest surviving node is 1 or 3
        let snapped = graph.nearest_node(36.0102, -94.1000).unwrap();
        assert_eq!(snapped.id, 3);
        assert!(snapped.distance_m > 1000.0);
    }

    #[test]
    fn test_way_with_missing_node() {
        let mut b = HighwayGraphBuilder::new().simplify(true);
        b.add_node(1, 36.0, -94.0);
        b.add_way(vec![1, 99]);
        let graph = b.build();
        assert_eq!(graph.node_count(), 1);
    }
}
