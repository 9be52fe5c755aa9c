use geo::MultiPolygon;

/// Identifies a tract within a state: three-digit county FIPS plus six-digit TRACTCE
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TractKey {
    pub county: String,
    pub tract: String,
}

impl TractKey {
    pub fn new(county: impl Into<String>, tract: impl Into<String>) -> Self {
        Self {
            county: county.into(),
            tract: tract.into(),
        }
    }
}

/// One row of the ACS response
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeRecord {
    pub name: String,
    pub key: TractKey,
    /// Parsed estimate, `None` when the API returned null or a non-number
    pub income: Option<f64>,
}

/// Tract polygon read from the TIGER shapefile
#[derive(Debug, Clone)]
pub struct TractBoundary {
    pub key: TractKey,
    pub geoid: String,
    pub geometry: MultiPolygon<f64>,
}

/// A tract present in both the income table and the boundary set
#[derive(Debug, Clone)]
pub struct CensusTract {
    pub key: TractKey,
    pub geoid: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    /// Median household income, always positive
    pub income: f64,
}
