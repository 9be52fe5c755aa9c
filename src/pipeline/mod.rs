//! The four analysis stages: supply, flow, demand and visualization.

pub mod demand;
pub mod flow;
pub mod supply;

pub use demand::{CensusSource, DemandSource, DemandSummary, join_tracts, run_demand_and_render};
pub use flow::annotate_distances;
pub use supply::{AreaCache, OsmSource, PoiSource, collect_supply};
