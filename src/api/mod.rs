pub mod census;
pub mod nominatim;
pub mod overpass;
pub mod tiger;

pub use census::{CensusError, fetch_income_table};
pub use nominatim::{PlaceArea, geocode_place};
pub use overpass::{OverpassResponse, fetch_amenities, fetch_highways};
pub use tiger::fetch_tract_boundaries;
