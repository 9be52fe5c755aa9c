pub mod parser;

pub use parser::{parse_highway_graph, parse_points_of_interest};
