pub mod category;
pub mod poi;
pub mod tract;

pub use category::SiteCategory;
pub use poi::PointOfInterest;
pub use tract::{CensusTract, IncomeRecord, TractBoundary, TractKey};
