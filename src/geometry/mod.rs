pub mod haversine;
pub mod polygon;
pub mod projection;

pub use haversine::haversine_m;
pub use polygon::{ring_centroid, shp_to_geo};
pub use projection::Projector;
